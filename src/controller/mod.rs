//! Viewport controller for the family tree graphic
//!
//! Owns the camera over the loaded tree, turns pointer/wheel/touch input
//! into camera updates, and manages member selection and highlighting.
//!
//! # State
//!
//! `Unloaded → Loading → Ready`; `Ready` loops on every gesture, selection,
//! highlight and export call, and a reload passes through `Loading` again.
//! A failed load falls back to whatever state preceded it.
//!
//! All operations report failure as a value after logging it; nothing here
//! panics or unwinds into the host.

pub mod tasks;

use async_trait::async_trait;
use kurbo::{Point, Rect};

use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};
use crate::export::{self, ExportedSvg, FileSink, ImageFetcher};
use crate::graphic::GraphicSurface;
use crate::models::gesture::touch_point;
use crate::models::{Camera, GestureState, PointerInput};

pub use tasks::{Clock, DeferredTask, ManualClock, TaskQueue};

/// Fetches the tree graphic's markup
#[async_trait(?Send)]
pub trait GraphicLoader {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerState {
    Unloaded,
    Loading,
    Ready,
}

pub type MemberClickCallback = Box<dyn Fn(&str)>;

pub struct ViewportController<S: GraphicSurface> {
    surface: S,
    config: ViewerConfig,
    clock: Box<dyn Clock>,
    state: ViewerState,
    /// State to fall back to if the load in progress fails
    fallback: ViewerState,
    camera: Camera,
    gesture: GestureState,
    tasks: TaskQueue,
    member_ids: Vec<String>,
    on_member_click: Option<MemberClickCallback>,
}

impl<S: GraphicSurface> ViewportController<S> {
    pub fn new(surface: S, config: ViewerConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            surface,
            config,
            clock,
            state: ViewerState::Unloaded,
            fallback: ViewerState::Unloaded,
            camera: Camera::default(),
            gesture: GestureState::default(),
            tasks: TaskQueue::new(),
            member_ids: Vec::new(),
            on_member_click: None,
        }
    }

    pub fn on_member_click(&mut self, callback: MemberClickCallback) {
        self.on_member_click = Some(callback);
    }

    pub fn state(&self) -> ViewerState {
        self.state
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Ids of the member elements bound for clicks at the last load
    pub fn member_ids(&self) -> &[String] {
        &self.member_ids
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.surface.has_class(id, &self.config.selected_class)
    }

    pub fn is_highlighted(&self, id: &str) -> bool {
        self.surface.has_class(id, &self.config.highlight_class)
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.tasks.next_deadline()
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Fetch `url` through `loader` and display it
    pub async fn load(&mut self, loader: &dyn GraphicLoader, url: &str) -> Result<()> {
        self.begin_load();
        let source = loader.fetch_text(url).await;
        self.complete_load(source)
    }

    pub fn begin_load(&mut self) {
        if self.state != ViewerState::Loading {
            self.fallback = self.state;
        }
        self.state = ViewerState::Loading;
    }

    /// Finish a load started with [`begin_load`](Self::begin_load)
    pub fn complete_load(&mut self, source: Result<String>) -> Result<()> {
        let markup = match source {
            Ok(markup) => markup,
            Err(e) => return self.fail_load(e),
        };
        log::info!("SVG content loaded, length: {}", markup.len());

        if let Err(e) = self.surface.mount(&markup) {
            return self.fail_load(e);
        }

        self.gesture.reset();
        self.tasks.clear();
        self.member_ids = self.surface.ids_with_class(&self.config.member_class);
        self.state = ViewerState::Ready;
        self.apply_camera();
        log::info!("Family tree loaded with {} members", self.member_ids.len());
        Ok(())
    }

    fn fail_load(&mut self, e: ViewerError) -> Result<()> {
        log::error!("Error loading SVG: {}", e);
        self.state = self.fallback;
        if self.state == ViewerState::Unloaded {
            self.surface.show_error(&self.config.load_error_message);
        }
        Err(e)
    }

    // ------------------------------------------------------------------
    // Camera
    // ------------------------------------------------------------------

    fn apply_camera(&mut self) {
        self.surface
            .apply_transform(&self.camera, &self.config.gesture_transition);
    }

    /// Translate raw input into a camera update; true if the camera changed
    pub fn pan_zoom(&mut self, input: PointerInput) -> bool {
        if self.state != ViewerState::Ready {
            return false;
        }

        let changed = match input {
            PointerInput::Wheel { delta_y, x, y } => self.wheel_zoom(delta_y, Point::new(x, y)),
            PointerInput::PointerDown { x, y } => {
                self.gesture
                    .begin_drag(Point::new(x, y), self.camera.translate());
                false
            }
            PointerInput::PointerMove { x, y } => self.drag_to(Point::new(x, y)),
            PointerInput::PointerUp => {
                self.gesture.end();
                false
            }
            PointerInput::TouchStart { touches } => {
                match touches.as_slice() {
                    [t] => self
                        .gesture
                        .begin_drag(touch_point(*t), self.camera.translate()),
                    [a, b] => self
                        .gesture
                        .begin_pinch(touch_point(*a), touch_point(*b), self.camera.scale),
                    _ => {}
                }
                false
            }
            PointerInput::TouchMove { touches } => match touches.as_slice() {
                [t] => self.drag_to(touch_point(*t)),
                [a, b] => self.pinch_to(touch_point(*a), touch_point(*b)),
                _ => false,
            },
            PointerInput::TouchEnd => {
                self.gesture.reset();
                false
            }
        };

        if changed {
            self.apply_camera();
        }
        changed
    }

    fn wheel_zoom(&mut self, delta_y: f64, cursor: Point) -> bool {
        let factor = if delta_y > 0.0 {
            self.config.wheel_zoom_out
        } else {
            self.config.wheel_zoom_in
        };
        let new_scale = self.camera.scale * factor;
        if !self.config.scale_in_bounds(new_scale) {
            return false;
        }
        self.camera.zoom_about(cursor, new_scale);
        true
    }

    fn drag_to(&mut self, pointer: Point) -> bool {
        match self.gesture.drag_to(pointer) {
            Some(translate) => {
                self.camera.set_translate(translate);
                true
            }
            None => false,
        }
    }

    // Not anchored to the pinch midpoint, unlike wheel zoom
    fn pinch_to(&mut self, a: Point, b: Point) -> bool {
        match self.gesture.pinch_scale(a, b) {
            Some(scale) if self.config.scale_in_bounds(scale) => {
                self.camera.scale = scale;
                true
            }
            _ => false,
        }
    }

    /// Back to scale 1 with the graphic origin at the wrapper origin
    pub fn reset_view(&mut self) {
        self.camera = Camera::default();
        if self.state == ViewerState::Ready {
            self.apply_camera();
        }
    }

    /// Pan so the center of element `id` lands on the given wrapper point.
    ///
    /// Resets scale to 1, animates the move, then selects and highlights the
    /// element. The animation is replaced by a plain transform once it has run.
    pub fn focus_element(&mut self, id: &str, center_x: f64, center_y: f64) -> Result<()> {
        self.ensure_loaded().inspect_err(|e| log::error!("{}", e))?;
        if !self.surface.contains(id) {
            let e = ViewerError::ElementNotFound(id.to_string());
            log::error!("SVG element with ID \"{}\" not found.", id);
            return Err(e);
        }
        let Some(ctm) = self.surface.ctm(id) else {
            log::error!("Could not read CTM for element: {}", id);
            return Err(ViewerError::InvalidGraphic(format!("no transform matrix for {}", id)));
        };
        let bbox = self.surface.bbox(id).unwrap_or(Rect::ZERO);
        let center = ctm * bbox.center();

        self.camera.scale = 1.0;
        self.camera.center_on(center, Point::new(center_x, center_y));
        self.surface
            .apply_transform(&self.camera, &self.config.focus_transition);

        self.tasks.cancel(&DeferredTask::SettleTransform);
        let due = self.clock.now_ms() + f64::from(self.config.focus_transition_ms);
        self.tasks.schedule(due, DeferredTask::SettleTransform);

        self.deselect_all();
        self.select(id);
        self.highlight(id, self.config.highlight_ms);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    fn ensure_loaded(&self) -> Result<()> {
        if self.state == ViewerState::Unloaded || !self.surface.is_mounted() {
            return Err(ViewerError::NotLoaded);
        }
        Ok(())
    }

    /// Check that `id` names a selectable member of the loaded graphic
    fn check_member(&self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(ViewerError::InvalidMemberId);
        }
        self.ensure_loaded()?;
        if !self.surface.contains(id) {
            return Err(ViewerError::ElementNotFound(id.to_string()));
        }
        if !self.surface.has_class(id, &self.config.member_class) {
            return Err(ViewerError::NotAMember(id.to_string()));
        }
        Ok(())
    }

    /// Mark member `id` as selected; other selections are kept
    pub fn select(&mut self, id: &str) -> bool {
        if let Err(e) = self.check_member(id) {
            log::error!("{}", e);
            return false;
        }
        self.surface.add_class(id, &self.config.selected_class)
    }

    /// Clear every selected member; returns how many were cleared
    pub fn deselect_all(&mut self) -> usize {
        if let Err(e) = self.ensure_loaded() {
            log::error!("{}", e);
            return 0;
        }
        let mut cleared = 0;
        for id in self.surface.ids_with_class(&self.config.selected_class) {
            if !self.surface.has_class(&id, &self.config.member_class) {
                continue;
            }
            if self.surface.remove_class(&id, &self.config.selected_class) {
                cleared += 1;
            }
        }
        cleared
    }

    /// Highlight member `id` for `duration_ms`, restarting a running highlight
    pub fn highlight(&mut self, id: &str, duration_ms: u32) -> bool {
        if let Err(e) = self.check_member(id) {
            log::error!("{}", e);
            return false;
        }
        let class = self.config.highlight_class.clone();
        if self.surface.has_class(id, &class) {
            self.surface.remove_class(id, &class);
            self.surface.force_reflow(id);
        }
        self.surface.add_class(id, &class);

        let task = DeferredTask::ClearHighlight { id: id.to_string() };
        self.tasks.cancel(&task);
        let due = self.clock.now_ms() + f64::from(duration_ms);
        self.tasks.schedule(due, task);
        true
    }

    /// Click on a member element: select only it and notify the host
    pub fn handle_member_click(&mut self, id: &str) -> bool {
        if id.is_empty() {
            return false;
        }
        self.deselect_all();
        let selected = self.select(id);
        if let Some(callback) = &self.on_member_click {
            callback(id);
        }
        selected
    }

    /// Run deferred work whose deadline has passed; returns how many tasks ran
    pub fn tick(&mut self) -> usize {
        let due = self.tasks.take_due(self.clock.now_ms());
        for task in &due {
            match task {
                DeferredTask::SettleTransform => self.apply_camera(),
                DeferredTask::ClearHighlight { id } => {
                    self.surface.remove_class(id, &self.config.highlight_class);
                }
            }
        }
        due.len()
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Markup of the displayed graphic, for [`export::prepare_export`]
    pub fn export_snapshot(&self) -> Result<String> {
        self.ensure_loaded()?;
        self.surface.snapshot()
    }

    /// Export the displayed graphic as a standalone SVG and hand it to `sink`
    pub async fn export(
        &self,
        fetcher: &dyn ImageFetcher,
        sink: &dyn FileSink,
        filename: &str,
    ) -> Result<ExportedSvg> {
        let snapshot = self
            .export_snapshot()
            .inspect_err(|e| log::error!("{}", e))?;
        let exported = export::prepare_export(&snapshot, &self.config, fetcher, filename)
            .await
            .inspect_err(|e| log::error!("Error downloading SVG: {}", e))?;
        sink.save(&exported.filename, export::SVG_MIME, &exported.markup)
            .inspect_err(|e| log::error!("Error downloading SVG: {}", e))?;
        log::info!("✓ Family tree SVG downloaded as \"{}\"", exported.filename);
        Ok(exported)
    }
}
