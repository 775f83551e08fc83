//! A canvas session: input in, actions dispatched, scene reconciled.
//!
//! The session owns the [`Store`] and every gesture controller. Controllers
//! only emit intents; all state changes go through [`Store::dispatch`], and
//! the scene is rebuilt from store state on [`CanvasSession::frame`].

use crate::backend::{NodeHandle, NodeKey, SceneBackend, SceneResult};
use crate::interaction::{DragMove, DragTarget, Overrides, selection_for_drag};
use crate::sync::{SceneFrame, SceneSync, SyncReport};
use kurbo::{Point, Size};
use std::collections::HashSet;
use thumbboard_core::config::CanvasConfig;
use thumbboard_core::critique::{Critique, CritiqueCache, CritiqueError, CritiqueProvider};
use thumbboard_core::import::{GridLayout, ImportError, ImportResult, ImportSource};
use thumbboard_core::input::{InputState, KeyEvent, Modifiers, MouseButton, PointerEvent};
use thumbboard_core::model::{Comment, EntityId, LabelStyle, LabelStylePatch, TextLabel};
use thumbboard_core::navigation::{ResizeDebouncer, ViewportController};
use thumbboard_core::presence::{
    ClientMessage, ConnectionState, PresenceError, PresenceOverlay, UserInfo, decode_server,
};
use thumbboard_core::selection::{MarqueeSelection, Selection, SelectionMode};
use thumbboard_core::shortcuts::{Command, ShortcutRegistry};
use thumbboard_core::state::{Action, AppState, ListenerId, Store};
use thumbboard_core::storage::{self, PreferenceStorage, StorageResult};
use thumbboard_core::time::{Instant, now_ms};
use thumbboard_core::tools::{StrokeBuilder, ToolKind, erase_hits, eraser_radius};
use thumbboard_core::viewport::Viewport;

/// Text of a freshly placed label.
pub const DEFAULT_LABEL_TEXT: &str = "Text";

const SPACE: &str = " ";

pub struct CanvasSession<B: SceneBackend> {
    config: CanvasConfig,
    store: Store,
    backend: B,
    sync: SceneSync,
    input: InputState,
    navigation: ViewportController,
    resize: ResizeDebouncer,
    marquee: MarqueeSelection,
    stroke: StrokeBuilder,
    drag: Option<DragMove>,
    erasing: bool,
    presence: PresenceOverlay,
    outgoing: Vec<ClientMessage>,
    critiques: CritiqueCache,
    grid: GridLayout,
    screen: Size,
    author: String,
}

impl<B: SceneBackend> CanvasSession<B> {
    pub fn new(config: CanvasConfig, backend: B, screen: Size) -> Self {
        let mut state = AppState::with_history_limit(config.history_limit);
        state.ui.viewport = Viewport::with_limits(config.min_scale, config.max_scale);
        Self {
            store: Store::new(state),
            backend,
            sync: SceneSync::new(),
            input: InputState::new(),
            navigation: ViewportController::new(&config),
            resize: ResizeDebouncer::from_config(&config),
            marquee: MarqueeSelection::new(config.marquee_threshold),
            stroke: StrokeBuilder::new(config.admission_distance, config.smoothing_tolerance),
            drag: None,
            erasing: false,
            presence: PresenceOverlay::default(),
            outgoing: Vec::new(),
            critiques: CritiqueCache::new(),
            grid: GridLayout::from(config.grid),
            screen,
            author: "You".to_string(),
            config,
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn scene(&self) -> &SceneSync {
        &self.sync
    }

    pub fn presence(&self) -> &PresenceOverlay {
        &self.presence
    }

    pub fn critiques(&self) -> &CritiqueCache {
        &self.critiques
    }

    pub fn screen(&self) -> Size {
        self.screen
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Author name stamped on new comments.
    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into();
    }

    pub fn dispatch(&mut self, action: Action) -> bool {
        self.store.dispatch(action)
    }

    /// Register a callback for viewport transform changes.
    pub fn on_viewport_change(&mut self, listener: impl FnMut(&Viewport) + 'static) -> ListenerId {
        self.store.subscribe_viewport(listener)
    }

    fn viewport(&self) -> Viewport {
        self.store.state().ui.viewport
    }

    // --- Input ---

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.input.set_modifiers(modifiers);
    }

    pub fn handle_pointer(&mut self, event: &PointerEvent, now: Instant) {
        self.input.handle_pointer_event_at(event, now);
        match *event {
            PointerEvent::Down { position, button } => self.pointer_down(position, button),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up { position, .. } => self.pointer_up(position),
            PointerEvent::Scroll { position, delta } => {
                self.navigation.queue_wheel(position, delta.y)
            }
        }
    }

    /// A pointer press the backend reported on one of its nodes.
    ///
    /// Returns `false` when the node is unknown or not draggable.
    pub fn node_pointer_down(&mut self, handle: NodeHandle, screen_point: Point) -> bool {
        let target = match self.sync.key_for(handle) {
            Some(NodeKey::Thumbnail(id)) => DragTarget::Thumbnail(id.clone()),
            Some(NodeKey::Label(id)) => DragTarget::Label(*id),
            Some(NodeKey::Comment(id)) => DragTarget::Comment(*id),
            _ => return false,
        };
        let world = self.viewport().screen_to_world(screen_point);
        self.begin_drag(target, world);
        true
    }

    fn pointer_down(&mut self, screen_point: Point, button: MouseButton) {
        let (viewport, tools) = {
            let ui = &self.store.state().ui;
            (ui.viewport, ui.tools)
        };
        if button == MouseButton::Middle || tools.tool == ToolKind::Pan {
            self.navigation.pan_start(screen_point);
            return;
        }
        if button != MouseButton::Left {
            return;
        }

        let world = viewport.screen_to_world(screen_point);
        match tools.tool {
            ToolKind::Select => match self.hit_test(world, viewport.scale) {
                Some(DragTarget::Label(id)) if self.input.is_double_click() => {
                    self.dispatch(Action::BeginLabelEdit { id });
                }
                Some(target) => self.begin_drag(target, world),
                None => self.marquee.start(world),
            },
            ToolKind::Draw(kind) => {
                self.stroke
                    .stroke_start(world, kind, tools.draw_layer, tools.brush, viewport.scale)
            }
            ToolKind::Eraser => {
                self.erasing = true;
                self.erase_at(world);
            }
            ToolKind::Comment => {
                self.dispatch(Action::OpenCommentDialog { position: world });
            }
            ToolKind::Label => {
                let label = TextLabel::new(world, DEFAULT_LABEL_TEXT.to_string(), LabelStyle::default());
                let id = label.id;
                self.dispatch(Action::AddLabel { label });
                self.dispatch(Action::BeginLabelEdit { id });
            }
            ToolKind::Pan => {}
        }
    }

    fn pointer_move(&mut self, screen_point: Point) {
        let viewport = self.viewport();
        if let Some(next) = self.navigation.pan_move(&viewport, screen_point) {
            self.dispatch(Action::SetViewport { viewport: next });
            return;
        }

        let world = viewport.screen_to_world(screen_point);
        if let Some(drag) = self.drag.as_mut() {
            drag.update(world);
        }
        if self.marquee.is_active() {
            self.marquee.update(world);
        }
        self.stroke.stroke_move(world);
        if self.erasing {
            self.erase_at(world);
        }
        self.send_cursor(world);
    }

    fn pointer_up(&mut self, screen_point: Point) {
        let viewport = self.viewport();
        let world = viewport.screen_to_world(screen_point);
        self.navigation.pan_end();

        if let Some(mut drag) = self.drag.take() {
            drag.update(world);
            if let Some(action) = drag.finish() {
                self.dispatch(action);
            }
        }

        if self.marquee.is_active() {
            let state = self.store.state();
            let next = self.marquee.end(
                world,
                &self.input.modifiers,
                &state.canvas,
                &state.selection,
                viewport.scale,
            );
            if let Some(selection) = next {
                self.dispatch(Action::SetSelection { selection });
            }
        }

        if self.stroke.is_active() {
            self.stroke.stroke_move(world);
            if let Some(drawing) = self.stroke.stroke_end() {
                self.dispatch(Action::AddDrawing { drawing });
            }
        }

        self.erasing = false;
    }

    /// Topmost draggable entity under a world point.
    fn hit_test(&self, world: Point, scale: f64) -> Option<DragTarget> {
        let canvas = &self.store.state().canvas;
        if let Some(id) = canvas.comment_at(world, scale) {
            return Some(DragTarget::Comment(id));
        }
        if let Some(id) = canvas.label_at(world) {
            return Some(DragTarget::Label(id));
        }
        canvas.thumbnail_at(world).map(DragTarget::Thumbnail)
    }

    fn begin_drag(&mut self, target: DragTarget, world: Point) {
        let modifiers = self.input.modifiers;
        let current = &self.store.state().selection;
        let next = if modifiers.shift || modifiers.command() {
            target_selection(&target).map(|hit| {
                current.combine(&hit, SelectionMode::from_modifiers(&modifiers))
            })
        } else {
            selection_for_drag(&target, current)
        };
        if let Some(selection) = next {
            self.dispatch(Action::SetSelection { selection });
        }

        let state = self.store.state();
        let still_selected = match &target {
            DragTarget::Thumbnail(id) => state.selection.contains_thumbnail(id),
            DragTarget::Label(id) => state.selection.contains_label(*id),
            DragTarget::Comment(_) => true,
        };
        // A toggle-click that deselected the target does not drag.
        self.drag = if still_selected {
            DragMove::begin(&target, world, &state.canvas, &state.selection)
        } else {
            None
        };
    }

    fn erase_at(&mut self, world: Point) {
        let state = self.store.state();
        let radius = eraser_radius(state.ui.tools.eraser_size, self.config.eraser_factor);
        let ids = erase_hits(&state.canvas, world, radius);
        if !ids.is_empty() {
            self.dispatch(Action::DeleteDrawings { ids });
        }
    }

    pub fn handle_key(&mut self, event: KeyEvent) {
        self.input.handle_key_event(event.clone());
        match event {
            KeyEvent::Pressed(key) => {
                let ui = &self.store.state().ui;
                // Typing into a label or the comment dialog only honours Escape.
                if (ui.editing_label.is_some() || ui.pending_comment.is_some()) && key != "Escape" {
                    return;
                }
                if key == SPACE {
                    let current = ui.tools.tool;
                    if let Some(tool) = self.navigation.space_pan_start(current) {
                        self.dispatch(Action::SetTool { tool });
                    }
                } else if let Some(command) = ShortcutRegistry::resolve(&key, &self.input.modifiers) {
                    self.run_command(command);
                }
            }
            KeyEvent::Released(key) if key == SPACE => {
                if let Some(tool) = self.navigation.space_pan_end() {
                    self.dispatch(Action::SetTool { tool });
                }
            }
            KeyEvent::Released(_) => {}
        }
    }

    /// Execute a command. Returns `true` when something changed.
    pub fn run_command(&mut self, command: Command) -> bool {
        log::debug!("command {:?}", command);
        let viewport = self.viewport();
        match command {
            Command::SelectAll => self.dispatch(Action::SelectAll),
            Command::Undo => self.store.undo(),
            Command::Redo => self.store.redo(),
            Command::DeleteSelection => self.dispatch(Action::DeleteSelection),
            Command::Cancel => self.cancel(),
            Command::ZoomIn => {
                let next = self.navigation.zoom_in(&viewport, self.screen);
                next.is_some_and(|viewport| self.dispatch(Action::SetViewport { viewport }))
            }
            Command::ZoomOut => {
                let next = self.navigation.zoom_out(&viewport, self.screen);
                next.is_some_and(|viewport| self.dispatch(Action::SetViewport { viewport }))
            }
            Command::ResetView => {
                let mut next = viewport;
                next.reset();
                self.dispatch(Action::SetViewport { viewport: next })
            }
            Command::FitToContent => match self.state().canvas.bounds() {
                Some(bounds) => {
                    let mut next = viewport;
                    next.fit_to_bounds(bounds, self.screen, self.config.fit_padding);
                    self.dispatch(Action::SetViewport { viewport: next })
                }
                None => false,
            },
            Command::ToggleLock => {
                let state = self.state();
                let ids: Vec<_> = state
                    .canvas
                    .thumbnails
                    .iter()
                    .filter(|t| state.selection.contains_thumbnail(&t.id))
                    .map(|t| t.id.clone())
                    .collect();
                if ids.is_empty() {
                    return false;
                }
                let locked = !ids.iter().all(|id| state.canvas.is_locked(id));
                self.dispatch(Action::SetLocked { ids, locked })
            }
            Command::ToggleSidebar => {
                let open = !self.state().ui.preferences.sidebar_open;
                self.dispatch(Action::SetSidebar {
                    open: Some(open),
                    width: None,
                })
            }
            Command::Tool(tool) => self.dispatch(Action::SetTool { tool }),
        }
    }

    /// Escape: abort the current gesture, else close a dialog, else clear the selection.
    fn cancel(&mut self) -> bool {
        let gesture = self.drag.is_some()
            || self.marquee.is_active()
            || self.stroke.is_active()
            || self.erasing
            || self.navigation.is_panning();
        if gesture {
            self.navigation.pan_end();
            self.drag = None;
            self.marquee.cancel();
            self.stroke.cancel();
            self.erasing = false;
            return true;
        }
        let (comment_open, editing, has_selection) = {
            let state = self.store.state();
            (
                state.ui.pending_comment.is_some(),
                state.ui.editing_label.is_some(),
                !state.selection.is_empty(),
            )
        };
        if comment_open {
            self.dispatch(Action::CloseCommentDialog)
        } else if editing {
            self.dispatch(Action::EndLabelEdit)
        } else if has_selection {
            self.dispatch(Action::ClearSelection)
        } else {
            false
        }
    }

    pub fn handle_resize(&mut self, size: Size, now: Instant) {
        self.resize.push(size, now);
    }

    // --- Frame ---

    /// Run per-frame work and bring the scene up to date.
    pub fn frame(&mut self, now: Instant) -> SceneResult<SyncReport> {
        let viewport = self.viewport();
        if let Some(next) = self.navigation.take_wheel_zoom(&viewport) {
            log::trace!(
                "wheel zoom to {:.3} ({} wheel events coalesced so far)",
                next.scale,
                self.navigation.coalesced_wheels()
            );
            self.dispatch(Action::SetViewport { viewport: next });
        }
        if let Some(size) = self.resize.poll(now) {
            log::info!("Resized to {}x{}", size.width, size.height);
            self.screen = size;
        }
        let expired = self.presence.expire(now);
        if !expired.is_empty() {
            log::debug!("expired cursors: {:?}", expired);
        }

        let state = self.store.state();
        let scale = state.ui.viewport.scale;
        let pending = self.marquee.pending(&state.canvas, scale);
        let overrides = self
            .drag
            .as_ref()
            .map(DragMove::overrides)
            .unwrap_or_default();
        let marquee = self.marquee.rect().filter(|_| !self.marquee.is_click(scale));
        let frame = SceneFrame {
            state,
            overrides: &overrides,
            pending: &pending,
            marquee,
            preview: self.stroke.preview(),
            presence: &self.presence,
            screen: self.screen,
        };
        let report = self.sync.reconcile(&mut self.backend, &frame);
        self.input.begin_frame();
        report
    }

    /// Positions shown for the drag in flight, if any.
    pub fn drag_overrides(&self) -> Overrides {
        self.drag
            .as_ref()
            .map(DragMove::overrides)
            .unwrap_or_default()
    }

    // --- Content ---

    /// Add imported videos to the board. Returns how many were new.
    pub fn import_result(&mut self, result: ImportResult) -> usize {
        if let Some(channel) = &result.channel_info {
            log::info!("Importing {} videos from {}", result.videos.len(), channel.name);
        }
        let canvas = &self.store.state().canvas;
        let mut seen = HashSet::new();
        let fresh: Vec<_> = result
            .videos
            .into_iter()
            .filter(|v| !canvas.has_thumbnail(&v.id) && seen.insert(v.id.clone()))
            .collect();
        if fresh.is_empty() {
            return 0;
        }
        let thumbnails = self.grid.place(fresh, canvas.thumbnails.len());
        let count = thumbnails.len();
        self.dispatch(Action::ImportThumbnails { thumbnails });
        count
    }

    pub async fn import_from<S: ImportSource + ?Sized>(
        &mut self,
        source: &S,
        query: &str,
    ) -> Result<usize, ImportError> {
        let result = source.import(query).await?;
        Ok(self.import_result(result))
    }

    /// Post the comment dialog. Empty text just closes the dialog.
    pub fn submit_comment(&mut self, text: &str) -> Option<EntityId> {
        let position = self.store.state().ui.pending_comment?;
        let text = text.trim();
        let id = if text.is_empty() {
            None
        } else {
            let comment = Comment::new(position, text.to_string(), self.author.clone(), now_ms());
            let id = comment.id;
            self.dispatch(Action::AddComment { comment });
            Some(id)
        };
        self.dispatch(Action::CloseCommentDialog);
        id
    }

    /// Commit text for the label being edited and leave edit mode.
    pub fn commit_label_text(&mut self, text: &str) -> bool {
        let Some(id) = self.store.state().ui.editing_label else {
            return false;
        };
        let changed = self
            .state()
            .canvas
            .label(id)
            .is_some_and(|label| label.text != text);
        if changed {
            self.dispatch(Action::UpdateLabelText {
                id,
                text: text.to_string(),
            });
        }
        self.dispatch(Action::EndLabelEdit);
        changed
    }

    /// Apply a style patch to every selected label.
    pub fn style_selected_labels(&mut self, patch: LabelStylePatch) -> bool {
        if patch.is_empty() {
            return false;
        }
        let state = self.state();
        let ids: Vec<EntityId> = state
            .canvas
            .labels
            .iter()
            .filter(|l| state.selection.contains_label(l.id))
            .map(|l| l.id)
            .collect();
        if ids.is_empty() {
            return false;
        }
        self.dispatch(Action::ApplyLabelStyle { ids, patch })
    }

    pub async fn critique<P: CritiqueProvider + ?Sized>(
        &mut self,
        provider: &P,
        thumbnail_id: &str,
    ) -> Result<Critique, CritiqueError> {
        let thumbnail = self
            .state()
            .canvas
            .thumbnail(thumbnail_id)
            .cloned()
            .ok_or_else(|| CritiqueError::UnknownThumbnail(thumbnail_id.to_string()))?;
        self.critiques.get_or_fetch(provider, &thumbnail).await
    }

    /// Selection as currently committed.
    pub fn selection(&self) -> &Selection {
        &self.store.state().selection
    }

    // --- Preferences ---

    pub async fn load_preferences<S: PreferenceStorage + ?Sized>(&mut self, storage: &S) -> bool {
        let prefs = storage::load_preferences(storage).await;
        self.dispatch(Action::SetSidebar {
            open: Some(prefs.sidebar_open),
            width: Some(prefs.sidebar_width),
        })
    }

    pub async fn save_preferences<S: PreferenceStorage + ?Sized>(
        &self,
        storage: &S,
    ) -> StorageResult<()> {
        storage::save_preferences(storage, &self.state().ui.preferences).await
    }

    // --- Presence ---

    pub fn join_room(&mut self, room: &str, user: UserInfo) {
        self.presence.set_connection_state(ConnectionState::Connecting);
        self.outgoing.push(ClientMessage::Join {
            room: room.to_string(),
            user,
        });
    }

    pub fn leave_room(&mut self) {
        if self.presence.connection_state() != ConnectionState::Disconnected {
            self.outgoing.push(ClientMessage::Leave);
        }
        self.presence.set_connection_state(ConnectionState::Disconnected);
    }

    /// Feed one relay message. Returns `true` when remote cursors changed.
    pub fn receive_presence(&mut self, text: &str, now: Instant) -> Result<bool, PresenceError> {
        let message = decode_server(text)?;
        Ok(self.presence.apply(message, now))
    }

    /// Messages waiting to be sent to the relay.
    pub fn take_outgoing(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.outgoing)
    }

    fn send_cursor(&mut self, world: Point) {
        if self.presence.connection_state() != ConnectionState::Connected {
            return;
        }
        // Only the latest unsent cursor position matters.
        if let Some(ClientMessage::Cursor { x, y }) = self.outgoing.last_mut() {
            *x = world.x;
            *y = world.y;
        } else {
            self.outgoing.push(ClientMessage::Cursor {
                x: world.x,
                y: world.y,
            });
        }
    }
}

fn target_selection(target: &DragTarget) -> Option<Selection> {
    let mut hit = Selection::new();
    match target {
        DragTarget::Thumbnail(id) => {
            hit.thumbnails.insert(id.clone());
        }
        DragTarget::Label(id) => {
            hit.labels.insert(*id);
        }
        DragTarget::Comment(_) => return None,
    }
    Some(hit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{NodeProps, SceneLayer};
    use crate::recording::RecordingBackend;
    use kurbo::Vec2;
    use thumbboard_core::import::VideoRecord;
    use thumbboard_core::model::{
        DrawKind, DrawLayer, Drawing, Platform, SerializableColor, StrokeStyle,
    };
    use thumbboard_core::storage::{MemoryStorage, Preferences};
    use thumbboard_core::time::Duration;

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

        fn dummy_raw_waker() -> RawWaker {
            fn no_op(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                dummy_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
            RawWaker::new(std::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);
        loop {
            if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
                return result;
            }
        }
    }

    fn videos(count: usize) -> ImportResult {
        ImportResult {
            videos: (0..count)
                .map(|i| VideoRecord {
                    id: format!("v{i}"),
                    title: format!("Video {i}"),
                    channel_name: "chan".to_string(),
                    thumbnail_url: String::new(),
                    duration_secs: None,
                    view_count: 100 * i as u64,
                    like_count: 0,
                    comment_count: 0,
                    published_days_ago: 1,
                    platform: Platform::YouTube,
                })
                .collect(),
            channel_info: None,
        }
    }

    fn session() -> CanvasSession<RecordingBackend> {
        CanvasSession::new(
            CanvasConfig::default(),
            RecordingBackend::new(),
            Size::new(1600.0, 1200.0),
        )
    }

    struct Pointer {
        now: Instant,
    }

    impl Pointer {
        fn new() -> Self {
            Self { now: Instant::now() }
        }

        fn tick(&mut self) -> Instant {
            // Far enough apart that presses never count as double clicks.
            self.now += Duration::from_secs(1);
            self.now
        }

        fn drag(&mut self, session: &mut CanvasSession<RecordingBackend>, from: Point, to: Point) {
            let down = PointerEvent::Down {
                position: from,
                button: MouseButton::Left,
            };
            session.handle_pointer(&down, self.tick());
            let mid = from.midpoint(to);
            session.handle_pointer(&PointerEvent::Move { position: mid }, self.tick());
            session.handle_pointer(&PointerEvent::Move { position: to }, self.tick());
            let up = PointerEvent::Up {
                position: to,
                button: MouseButton::Left,
            };
            session.handle_pointer(&up, self.tick());
        }

        fn click(&mut self, session: &mut CanvasSession<RecordingBackend>, at: Point) {
            let now = self.tick();
            session.handle_pointer(
                &PointerEvent::Down {
                    position: at,
                    button: MouseButton::Left,
                },
                now,
            );
            session.handle_pointer(
                &PointerEvent::Up {
                    position: at,
                    button: MouseButton::Left,
                },
                now,
            );
        }
    }

    fn press(session: &mut CanvasSession<RecordingBackend>, key: &str, modifiers: Modifiers) {
        session.set_modifiers(modifiers);
        session.handle_key(KeyEvent::Pressed(key.to_string()));
        session.handle_key(KeyEvent::Released(key.to_string()));
        session.set_modifiers(Modifiers::NONE);
    }

    #[test]
    fn test_import_marquee_delete_undo_restores_positions() {
        let mut session = session();
        let mut pointer = Pointer::new();
        assert_eq!(session.import_result(videos(10)), 10);
        session.frame(pointer.now).unwrap();
        assert_eq!(session.backend().count_in_layer(SceneLayer::Thumbnails), 10);

        // Nudge v0 so it has an explicit position.
        pointer.drag(&mut session, Point::new(110.0, 110.0), Point::new(160.0, 110.0));
        assert_eq!(
            session.state().canvas.thumbnail_position("v0"),
            Some(Point::new(150.0, 100.0))
        );

        pointer.drag(&mut session, Point::new(90.0, 50.0), Point::new(1000.0, 200.0));
        let selected: HashSet<_> = ["v0", "v1", "v2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(session.selection().thumbnails, selected);

        press(&mut session, "Delete", Modifiers::NONE);
        assert_eq!(session.state().canvas.thumbnails.len(), 7);
        assert!(session.state().canvas.positions.is_empty());
        assert!(session.selection().is_empty());
        session.frame(pointer.tick()).unwrap();
        assert_eq!(session.backend().count_in_layer(SceneLayer::Thumbnails), 7);

        press(&mut session, "z", Modifiers::ctrl());
        let canvas = &session.state().canvas;
        assert_eq!(canvas.thumbnails.len(), 10);
        assert_eq!(canvas.thumbnail_position("v0"), Some(Point::new(150.0, 100.0)));
        assert_eq!(canvas.thumbnail_position("v1"), Some(Point::new(460.0, 100.0)));
        assert_eq!(session.selection().thumbnails, selected);

        session.frame(pointer.tick()).unwrap();
        let node = session
            .backend()
            .find(&NodeKey::Thumbnail("v0".into()))
            .unwrap();
        let crate::backend::NodeProps::Thumbnail { bounds, .. } = &node.props else {
            panic!("wrong props");
        };
        assert_eq!(bounds.origin(), Point::new(150.0, 100.0));
        assert!(node.visual.selected);
    }

    #[test]
    fn test_marquee_click_keeps_selection() {
        let mut session = session();
        let mut pointer = Pointer::new();
        session.import_result(videos(3));
        session.dispatch(Action::SelectAll);
        pointer.drag(&mut session, Point::new(20.0, 20.0), Point::new(21.0, 21.0));
        assert_eq!(session.selection().len(), 3);
    }

    #[test]
    fn test_shift_marquee_unions() {
        let mut session = session();
        let mut pointer = Pointer::new();
        session.import_result(videos(3));
        pointer.drag(&mut session, Point::new(90.0, 50.0), Point::new(200.0, 200.0));
        session.set_modifiers(Modifiers::shift());
        pointer.drag(&mut session, Point::new(800.0, 50.0), Point::new(900.0, 200.0));
        assert_eq!(session.selection().len(), 2);
        assert!(session.selection().contains_thumbnail("v2"));
    }

    #[test]
    fn test_drag_commits_one_history_entry() {
        let mut session = session();
        let mut pointer = Pointer::new();
        session.import_result(videos(2));
        let before = session.state().history.past_len();
        pointer.drag(&mut session, Point::new(110.0, 110.0), Point::new(200.0, 300.0));
        // One entry for the selection change, one for the move.
        assert_eq!(session.state().history.past_len(), before + 2);
        assert!(!session.is_dragging());
        assert!(session.drag_overrides().is_empty());
    }

    #[test]
    fn test_overrides_shown_mid_drag() {
        let mut session = session();
        let mut pointer = Pointer::new();
        session.import_result(videos(1));
        session.handle_pointer(
            &PointerEvent::Down {
                position: Point::new(110.0, 110.0),
                button: MouseButton::Left,
            },
            pointer.tick(),
        );
        session.handle_pointer(
            &PointerEvent::Move {
                position: Point::new(130.0, 110.0),
            },
            pointer.tick(),
        );
        assert_eq!(
            session.drag_overrides().thumbnails["v0"],
            Point::new(120.0, 100.0)
        );
        // Not committed yet.
        assert!(session.state().canvas.positions.is_empty());

        press(&mut session, "Escape", Modifiers::NONE);
        assert!(!session.is_dragging());
        assert!(session.state().canvas.positions.is_empty());
    }

    #[test]
    fn test_locked_thumbnail_selects_but_does_not_move() {
        let mut session = session();
        let mut pointer = Pointer::new();
        session.import_result(videos(1));
        pointer.click(&mut session, Point::new(110.0, 110.0));
        press(&mut session, "L", Modifiers { ctrl: true, shift: true, ..Modifiers::NONE });
        assert!(session.state().canvas.is_locked("v0"));

        pointer.drag(&mut session, Point::new(110.0, 110.0), Point::new(300.0, 110.0));
        assert!(session.state().canvas.positions.is_empty());

        press(&mut session, "L", Modifiers { ctrl: true, shift: true, ..Modifiers::NONE });
        assert!(!session.state().canvas.is_locked("v0"));
    }

    #[test]
    fn test_wheel_events_coalesce_per_frame() {
        let mut session = session();
        let mut pointer = Pointer::new();
        for dy in [-50.0, -80.0, -100.0] {
            session.handle_pointer(
                &PointerEvent::Scroll {
                    position: Point::new(200.0, 200.0),
                    delta: Vec2::new(0.0, dy),
                },
                pointer.tick(),
            );
        }
        session.frame(pointer.tick()).unwrap();
        let viewport = session.state().ui.viewport;
        assert!((viewport.scale - 1.1).abs() < 1e-9);
        let anchor = viewport.screen_to_world(Point::new(200.0, 200.0));
        assert!((anchor - Point::new(200.0, 200.0)).hypot() < 1e-9);
        assert_eq!(session.backend().transform(), viewport.transform());
    }

    #[test]
    fn test_space_pan_restores_tool() {
        let mut session = session();
        let mut pointer = Pointer::new();
        let pen = ToolKind::Draw(DrawKind::Freehand);
        session.dispatch(Action::SetTool { tool: pen });

        session.handle_key(KeyEvent::Pressed(SPACE.to_string()));
        session.handle_key(KeyEvent::Pressed(SPACE.to_string()));
        assert_eq!(session.state().ui.tools.tool, ToolKind::Pan);
        pointer.drag(&mut session, Point::new(10.0, 10.0), Point::new(40.0, 50.0));
        assert_eq!(session.state().ui.viewport.offset, Vec2::new(30.0, 40.0));
        assert!(session.state().canvas.drawings.is_empty());

        session.handle_key(KeyEvent::Released(SPACE.to_string()));
        assert_eq!(session.state().ui.tools.tool, pen);
    }

    #[test]
    fn test_viewport_callback() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut session = session();
        let scales = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&scales);
        session.on_viewport_change(move |v| sink.borrow_mut().push(v.scale));
        press(&mut session, "=", Modifiers::NONE);
        press(&mut session, "-", Modifiers::NONE);
        assert_eq!(scales.borrow().len(), 2);
        assert!((scales.borrow()[0] - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_draw_then_erase_then_undo() {
        let mut session = session();
        let mut pointer = Pointer::new();
        session.dispatch(Action::SetTool {
            tool: ToolKind::Draw(DrawKind::Freehand),
        });
        pointer.drag(&mut session, Point::new(0.0, 0.0), Point::new(40.0, 0.0));
        assert_eq!(session.state().canvas.drawings.len(), 1);
        session.frame(pointer.tick()).unwrap();
        assert_eq!(session.backend().count_in_layer(SceneLayer::DrawingsAbove), 1);

        session.dispatch(Action::SetTool { tool: ToolKind::Eraser });
        pointer.click(&mut session, Point::new(40.0, 5.0));
        assert!(session.state().canvas.drawings.is_empty());

        press(&mut session, "z", Modifiers::ctrl());
        assert_eq!(session.state().canvas.drawings.len(), 1);
    }

    #[test]
    fn test_stroke_preview_is_transient() {
        let mut session = session();
        let mut pointer = Pointer::new();
        session.dispatch(Action::SetTool {
            tool: ToolKind::Draw(DrawKind::Rectangle),
        });
        session.handle_pointer(
            &PointerEvent::Down {
                position: Point::new(0.0, 0.0),
                button: MouseButton::Left,
            },
            pointer.tick(),
        );
        session.handle_pointer(
            &PointerEvent::Move {
                position: Point::new(50.0, 50.0),
            },
            pointer.tick(),
        );
        session.frame(pointer.tick()).unwrap();
        assert!(session.backend().find(&NodeKey::StrokePreview).is_some());

        press(&mut session, "Escape", Modifiers::NONE);
        session.frame(pointer.tick()).unwrap();
        assert!(session.backend().find(&NodeKey::StrokePreview).is_none());
        assert!(session.state().canvas.drawings.is_empty());
    }

    #[test]
    fn test_comment_dialog_flow() {
        let mut session = session();
        let mut pointer = Pointer::new();
        session.set_author("Ann");
        press(&mut session, "c", Modifiers::NONE);
        pointer.click(&mut session, Point::new(500.0, 500.0));
        assert_eq!(session.state().ui.pending_comment, Some(Point::new(500.0, 500.0)));

        // Shortcuts are ignored while the dialog is open.
        press(&mut session, "v", Modifiers::NONE);
        assert_eq!(session.state().ui.tools.tool, ToolKind::Comment);

        let id = session.submit_comment("  Great hook  ").unwrap();
        let comment = session.state().canvas.comment(id).unwrap();
        assert_eq!(comment.text, "Great hook");
        assert_eq!(comment.author, "Ann");
        assert!(session.state().ui.pending_comment.is_none());

        pointer.click(&mut session, Point::new(10.0, 10.0));
        assert!(session.submit_comment("   ").is_none());
        assert_eq!(session.state().canvas.comments.len(), 1);
    }

    #[test]
    fn test_label_tool_creates_and_edits() {
        let mut session = session();
        let mut pointer = Pointer::new();
        session.dispatch(Action::SetTool { tool: ToolKind::Label });
        pointer.click(&mut session, Point::new(300.0, 300.0));
        let id = session.state().ui.editing_label.unwrap();
        assert!(session.commit_label_text("Hook"));
        assert_eq!(session.state().canvas.label(id).unwrap().text, "Hook");
        assert!(session.state().ui.editing_label.is_none());

        session.dispatch(Action::SelectAll);
        assert!(session.style_selected_labels(LabelStylePatch {
            bold: Some(true),
            ..LabelStylePatch::default()
        }));
        assert!(session.state().canvas.label(id).unwrap().style.bold);
        assert!(!session.style_selected_labels(LabelStylePatch::default()));
    }

    #[test]
    fn test_double_click_label_enters_edit() {
        let mut session = session();
        let label = TextLabel::new(Point::new(100.0, 100.0), "Hi".into(), LabelStyle::default());
        let id = label.id;
        session.dispatch(Action::AddLabel { label });
        let at = Point::new(105.0, 105.0);
        let t0 = Instant::now();
        for dt in [0, 100] {
            let now = t0 + Duration::from_millis(dt);
            session.handle_pointer(&PointerEvent::Down { position: at, button: MouseButton::Left }, now);
            session.handle_pointer(&PointerEvent::Up { position: at, button: MouseButton::Left }, now);
        }
        assert_eq!(session.state().ui.editing_label, Some(id));
        assert!(session.selection().contains_label(id));
    }

    #[test]
    fn test_escape_order() {
        let mut session = session();
        session.import_result(videos(2));
        session.dispatch(Action::SelectAll);
        press(&mut session, "Escape", Modifiers::NONE);
        assert!(session.selection().is_empty());
        assert!(!session.run_command(Command::Cancel));
    }

    #[test]
    fn test_space_while_editing_label_is_text() {
        let mut session = session();
        let mut pointer = Pointer::new();
        session.dispatch(Action::SetTool { tool: ToolKind::Label });
        pointer.click(&mut session, Point::new(300.0, 300.0));
        assert!(session.state().ui.editing_label.is_some());

        press(&mut session, SPACE, Modifiers::NONE);
        assert_eq!(session.state().ui.tools.tool, ToolKind::Label);
        assert!(session.state().ui.editing_label.is_some());

        press(&mut session, "Escape", Modifiers::NONE);
        assert!(session.state().ui.editing_label.is_none());
        session.handle_key(KeyEvent::Pressed(SPACE.to_string()));
        assert_eq!(session.state().ui.tools.tool, ToolKind::Pan);
    }

    #[test]
    fn test_escape_stops_middle_button_pan() {
        let mut session = session();
        let mut pointer = Pointer::new();
        session.handle_pointer(
            &PointerEvent::Down {
                position: Point::new(10.0, 10.0),
                button: MouseButton::Middle,
            },
            pointer.tick(),
        );
        session.handle_pointer(
            &PointerEvent::Move {
                position: Point::new(20.0, 10.0),
            },
            pointer.tick(),
        );
        assert_eq!(session.state().ui.viewport.offset, Vec2::new(10.0, 0.0));

        press(&mut session, "Escape", Modifiers::NONE);
        session.handle_pointer(
            &PointerEvent::Move {
                position: Point::new(80.0, 90.0),
            },
            pointer.tick(),
        );
        assert_eq!(session.state().ui.viewport.offset, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_inverted_scale_limits_in_config() {
        let config = CanvasConfig {
            min_scale: 4.0,
            max_scale: 0.5,
            ..CanvasConfig::default()
        };
        let mut session = CanvasSession::new(config, RecordingBackend::new(), Size::new(800.0, 600.0));
        let viewport = session.state().ui.viewport;
        assert_eq!((viewport.min_scale, viewport.max_scale), (0.5, 4.0));

        for _ in 0..40 {
            session.run_command(Command::ZoomIn);
        }
        assert_eq!(session.state().ui.viewport.scale, 4.0);
        session.frame(Instant::now()).unwrap();
    }

    #[test]
    fn test_pointless_shape_is_not_added() {
        let mut session = session();
        let drawing = Drawing::new(
            DrawKind::Rectangle,
            DrawLayer::Above,
            StrokeStyle::default(),
            Vec::new(),
        );
        assert!(!session.dispatch(Action::AddDrawing { drawing }));
        assert!(session.state().canvas.drawings.is_empty());
        session.frame(Instant::now()).unwrap();
    }

    #[test]
    fn test_import_skips_known_ids_and_continues_grid() {
        let mut session = session();
        session.import_result(videos(3));
        assert_eq!(session.import_result(videos(3)), 0);
        let mut more = videos(7);
        more.videos.push(more.videos[6].clone());
        assert_eq!(session.import_result(more), 4);
        let v3 = session.state().canvas.thumbnail("v3").unwrap();
        assert_eq!(v3.default_position, Point::new(1180.0, 100.0));
        let v5 = session.state().canvas.thumbnail("v5").unwrap();
        assert_eq!(v5.default_position, Point::new(100.0, 380.0));
    }

    #[test]
    fn test_fit_to_content_and_reset() {
        let mut session = session();
        session.import_result(videos(10));
        assert!(session.run_command(Command::FitToContent));
        let visible = session.state().ui.viewport.visible_world_rect(session.screen());
        let bounds = session.state().canvas.bounds().unwrap();
        assert!(visible.contains(bounds.origin()));
        assert!(session.run_command(Command::ResetView));
        assert_eq!(session.state().ui.viewport.scale, 1.0);
    }

    #[test]
    fn test_resize_is_debounced() {
        let mut session = session();
        let t0 = Instant::now();
        session.handle_resize(Size::new(800.0, 600.0), t0);
        session.handle_resize(Size::new(1024.0, 768.0), t0 + Duration::from_millis(100));
        session.frame(t0 + Duration::from_millis(200)).unwrap();
        assert_eq!(session.screen(), Size::new(1600.0, 1200.0));
        session.frame(t0 + Duration::from_millis(260)).unwrap();
        assert_eq!(session.screen(), Size::new(1024.0, 768.0));
        assert_eq!(session.backend().size(), Size::new(1024.0, 768.0));
    }

    #[test]
    fn test_presence_round_trip() {
        let mut session = session();
        let mut pointer = Pointer::new();
        session.join_room(
            "board-1",
            UserInfo {
                name: "Me".into(),
                color: "#123456".into(),
            },
        );
        let joined = r#"{"type":"joined","room":"board-1","user_id":"me","peer_count":2}"#;
        assert!(!session.receive_presence(joined, pointer.now).unwrap());
        let sent = session.take_outgoing();
        assert!(matches!(sent.as_slice(), [ClientMessage::Join { .. }]));

        for x in [10.0, 20.0] {
            session.handle_pointer(
                &PointerEvent::Move {
                    position: Point::new(x, 5.0),
                },
                pointer.tick(),
            );
        }
        assert_eq!(
            session.take_outgoing(),
            vec![ClientMessage::Cursor { x: 20.0, y: 5.0 }]
        );

        let cursor = r##"{"type":"cursor","user_id":"peer","x":1.0,"y":2.0,"name":"P","color":"#ff0000"}"##;
        assert!(session.receive_presence(cursor, pointer.now).unwrap());
        session.frame(pointer.now).unwrap();
        assert!(session.backend().find(&NodeKey::RemoteCursor("peer".into())).is_some());
        assert!(session.state().history.past_len() == 0);

        session.frame(pointer.now + Duration::from_secs(30)).unwrap();
        assert!(session.backend().find(&NodeKey::RemoteCursor("peer".into())).is_none());
        assert!(session.receive_presence("nope", pointer.now).is_err());
    }

    #[test]
    fn test_remote_cursor_with_non_ascii_color() {
        let mut session = session();
        let now = Instant::now();
        session.join_room(
            "board-1",
            UserInfo {
                name: "Me".into(),
                color: "#123456".into(),
            },
        );
        let joined = r#"{"type":"joined","room":"board-1","user_id":"me","peer_count":2}"#;
        session.receive_presence(joined, now).unwrap();
        let cursor = r##"{"type":"cursor","user_id":"peer","x":1.0,"y":2.0,"name":"P","color":"#aé"}"##;
        assert!(session.receive_presence(cursor, now).unwrap());

        session.frame(now).unwrap();
        let node = session
            .backend()
            .find(&NodeKey::RemoteCursor("peer".into()))
            .unwrap();
        assert!(matches!(
            &node.props,
            NodeProps::RemoteCursor { color, .. } if *color == SerializableColor::black()
        ));
    }

    #[test]
    fn test_preferences_load_and_save() {
        let mut session = session();
        let storage = MemoryStorage::new();
        let saved = Preferences {
            sidebar_open: false,
            sidebar_width: 480.0,
        };
        block_on(storage::save_preferences(&storage, &saved)).unwrap();
        assert!(block_on(session.load_preferences(&storage)));
        assert_eq!(session.state().ui.preferences, saved);

        press(&mut session, "b", Modifiers::ctrl());
        block_on(session.save_preferences(&storage)).unwrap();
        assert!(block_on(storage::load_preferences(&storage)).sidebar_open);
    }

    #[test]
    fn test_node_events_route_to_drag() {
        let mut session = session();
        let mut pointer = Pointer::new();
        session.import_result(videos(2));
        session.frame(pointer.now).unwrap();
        let handle = session
            .scene()
            .handle_for(&NodeKey::Thumbnail("v1".into()))
            .unwrap();
        assert!(session.node_pointer_down(handle, Point::new(470.0, 110.0)));
        assert!(session.is_dragging());
        session.handle_pointer(
            &PointerEvent::Up {
                position: Point::new(480.0, 120.0),
                button: MouseButton::Left,
            },
            pointer.tick(),
        );
        assert_eq!(
            session.state().canvas.thumbnail_position("v1"),
            Some(Point::new(470.0, 110.0))
        );
        assert!(!session.node_pointer_down(NodeHandle(9999), Point::ZERO));
    }
}
