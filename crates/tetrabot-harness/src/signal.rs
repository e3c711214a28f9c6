use std::collections::VecDeque;

/// Out-of-band request observed between decision steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum ControlSignal {
    /// Flip rendering on or off.
    ToggleRender,
    /// Stop the current episode and the whole run.
    Quit,
}

/// Source of control signals, polled once per step.
///
/// `poll` is drained until it returns `None`; it must never block.
pub trait SignalSource {
    fn poll(&mut self) -> Option<ControlSignal>;
}

impl<S> SignalSource for &mut S
where
    S: SignalSource + ?Sized,
{
    fn poll(&mut self) -> Option<ControlSignal> {
        (**self).poll()
    }
}

/// Signal source that never fires.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSignals;

impl SignalSource for NoSignals {
    fn poll(&mut self) -> Option<ControlSignal> {
        None
    }
}

/// Signal source that replays a fixed schedule.
///
/// Each entry is the batch of signals delivered on one poll round; an empty
/// batch means "nothing this step". Once the schedule runs out nothing fires.
#[derive(Debug, Default, Clone)]
pub struct ScriptedSignals {
    rounds: VecDeque<Vec<ControlSignal>>,
    pending: VecDeque<ControlSignal>,
    in_round: bool,
}

impl ScriptedSignals {
    #[must_use]
    pub fn new<I>(rounds: I) -> Self
    where
        I: IntoIterator<Item = Vec<ControlSignal>>,
    {
        Self {
            rounds: rounds.into_iter().collect(),
            pending: VecDeque::new(),
            in_round: false,
        }
    }
}

impl SignalSource for ScriptedSignals {
    fn poll(&mut self) -> Option<ControlSignal> {
        if !self.in_round {
            self.in_round = true;
            self.pending = self.rounds.pop_front().unwrap_or_default().into();
        }
        let signal = self.pending.pop_front();
        if signal.is_none() {
            self.in_round = false;
        }
        signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(source: &mut impl SignalSource) -> Vec<ControlSignal> {
        iter_until_none(|| source.poll())
    }

    fn iter_until_none<F>(mut f: F) -> Vec<ControlSignal>
    where
        F: FnMut() -> Option<ControlSignal>,
    {
        let mut out = vec![];
        while let Some(signal) = f() {
            out.push(signal);
        }
        out
    }

    #[test]
    fn scripted_signals_deliver_one_round_per_drain() {
        let mut source = ScriptedSignals::new([
            vec![ControlSignal::ToggleRender, ControlSignal::ToggleRender],
            vec![],
            vec![ControlSignal::Quit],
        ]);

        assert_eq!(
            drain(&mut source),
            [ControlSignal::ToggleRender, ControlSignal::ToggleRender]
        );
        assert_eq!(drain(&mut source), []);
        assert_eq!(drain(&mut source), [ControlSignal::Quit]);
        assert_eq!(drain(&mut source), []);
    }
}
