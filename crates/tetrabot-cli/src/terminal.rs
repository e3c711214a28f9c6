use std::{
    thread,
    time::{Duration, Instant},
};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;
use tetrabot_engine::{IllegalPlacement, Placement, TetrisEnv};
use tetrabot_harness::{
    ControlSignal, Environment, NextStates, Reseed, SignalSource, StateVector, Step,
};

use crate::ui::{EpisodeDisplay, PausedNotice};

/// [`TetrisEnv`] drawn on the terminal.
///
/// Frames are paced so that consecutive renders are at least one frame
/// interval apart.
pub struct TerminalEnv<'a> {
    env: TetrisEnv,
    terminal: &'a mut DefaultTerminal,
    render_enabled: bool,
    last_frame: Option<Instant>,
}

impl<'a> TerminalEnv<'a> {
    pub fn new(env: TetrisEnv, terminal: &'a mut DefaultTerminal, render_enabled: bool) -> Self {
        Self {
            env,
            terminal,
            render_enabled,
            last_frame: None,
        }
    }

    fn pace(&mut self, framerate: u32) {
        if framerate > 0 {
            let interval = Duration::from_secs(1) / framerate;
            if let Some(elapsed) = self.last_frame.map(|last| last.elapsed()) {
                thread::sleep(interval.saturating_sub(elapsed));
            }
        }
        self.last_frame = Some(Instant::now());
    }
}

impl Environment for TerminalEnv<'_> {
    type Action = Placement;
    type Error = IllegalPlacement;

    fn state_size(&self) -> usize {
        self.env.state_size()
    }

    fn reset(&mut self) -> StateVector {
        self.env.reset()
    }

    fn next_states(&self) -> NextStates<Placement> {
        self.env.next_states()
    }

    fn step(&mut self, action: &Placement) -> Result<Step, IllegalPlacement> {
        self.env.step(action)
    }

    fn render_enabled(&self) -> bool {
        self.render_enabled
    }

    fn toggle_render(&mut self) {
        self.render_enabled = !self.render_enabled;
        tracing::debug!(render = self.render_enabled, "rendering toggled");
        if self.render_enabled {
            return;
        }
        if let Err(e) = self
            .terminal
            .draw(|frame| frame.render_widget(PausedNotice, frame.area()))
        {
            tracing::warn!(error = %e, "failed to draw frame");
        }
    }

    fn render(&mut self, total_reward: f32, framerate: u32) {
        let display = EpisodeDisplay::new(&self.env, total_reward);
        if let Err(e) = self
            .terminal
            .draw(|frame| frame.render_widget(&display, frame.area()))
        {
            tracing::warn!(error = %e, "failed to draw frame");
        }
        self.pace(framerate);
    }
}

impl Reseed for TerminalEnv<'_> {
    fn seed(&self) -> u64 {
        self.env.seed()
    }

    fn set_seed(&mut self, seed: u64) {
        self.env.set_seed(seed);
    }
}

/// Keyboard signals, read without blocking.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeySignals;

impl SignalSource for KeySignals {
    fn poll(&mut self) -> Option<ControlSignal> {
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to poll terminal events");
                    return None;
                }
            }
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if let Some(signal) = signal_for(key) {
                        return Some(signal);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read terminal event");
                    return None;
                }
            }
        }
    }
}

fn signal_for(key: KeyEvent) -> Option<ControlSignal> {
    match key.code {
        KeyCode::Char('r' | 'R') => Some(ControlSignal::ToggleRender),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(ControlSignal::Quit)
        }
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Some(ControlSignal::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn keys_map_to_signals() {
        assert_eq!(
            signal_for(key(KeyCode::Char('r'), KeyModifiers::NONE)),
            Some(ControlSignal::ToggleRender)
        );
        assert_eq!(
            signal_for(key(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(ControlSignal::Quit)
        );
        assert_eq!(
            signal_for(key(KeyCode::Esc, KeyModifiers::NONE)),
            Some(ControlSignal::Quit)
        );
        assert_eq!(
            signal_for(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(ControlSignal::Quit)
        );
        assert_eq!(signal_for(key(KeyCode::Char('c'), KeyModifiers::NONE)), None);
        assert_eq!(signal_for(key(KeyCode::Left, KeyModifiers::NONE)), None);
    }
}
