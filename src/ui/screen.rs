use ratatui::Frame;

use crate::backend::Backend;
use crate::controller::SessionPhase;
use crate::snapshot::SnapshotSource;
use crate::App;

/// A UI Screen boundary: responsible for rendering one phase of the session
pub trait Screen<B: Backend, S: SnapshotSource> {
    fn render(&self, app: &App<B, S>, f: &mut Frame);
}

/// Task is being generated
pub struct LoadingScreen;

impl<B: Backend, S: SnapshotSource> Screen<B, S> for LoadingScreen {
    fn render(&self, app: &App<B, S>, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// The live assessment: task, answer editor, countdown, warnings
pub struct SessionScreen;

impl<B: Backend, S: SnapshotSource> Screen<B, S> for SessionScreen {
    fn render(&self, app: &App<B, S>, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Terminal states: submitted confirmation or unrecoverable load failure
pub struct TerminalScreen;

impl<B: Backend, S: SnapshotSource> Screen<B, S> for TerminalScreen {
    fn render(&self, app: &App<B, S>, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Helper to construct the appropriate screen for the current phase
pub fn current_screen<B: Backend, S: SnapshotSource>(
    app: &App<B, S>,
) -> Box<dyn Screen<B, S>> {
    match app.controller.phase() {
        SessionPhase::Loading => Box::new(LoadingScreen),
        SessionPhase::Ready | SessionPhase::InProgress => Box::new(SessionScreen),
        SessionPhase::Submitting | SessionPhase::Submitted | SessionPhase::Failed => {
            Box::new(TerminalScreen)
        }
    }
}
