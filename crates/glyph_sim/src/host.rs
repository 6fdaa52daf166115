//! Host-side frame scheduling.
//!
//! The engine never talks to a window, canvas or animation-frame API directly.
//! A [`FrameHost`] schedules frames and reports time; a [`FrameDriver`] turns
//! fired frames into `GlyphField::step` calls and owns the pending handle so a
//! stopped or resized loop never leaves a dangling callback behind.

use glyph_core::Viewport;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::field::GlyphField;

/// Minimal surface of the host's animation-frame loop
pub trait FrameHost {
    /// Identifies one scheduled frame
    type Handle: Copy + PartialEq + Debug;

    /// Ask for one more frame callback
    fn schedule_frame(&mut self) -> Self::Handle;

    /// Withdraw a frame that has not fired yet
    fn cancel_frame(&mut self, handle: Self::Handle);

    /// Milliseconds since an arbitrary origin
    fn now(&self) -> f64;
}

/// Cloneable stop flag; once stopped, the driver never reschedules
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Drives a field from a host's frame callbacks
pub struct FrameDriver<H: FrameHost> {
    host: H,
    pending: Option<H::Handle>,
    last_timestamp: Option<f64>,
    stop: StopHandle,
}

impl<H: FrameHost> FrameDriver<H> {
    pub fn new(host: H) -> Self {
        Self { host, pending: None, last_timestamp: None, stop: StopHandle::default() }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn pending(&self) -> Option<H::Handle> {
        self.pending
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some() && !self.stop.is_stopped()
    }

    /// Schedule the first frame (no-op if one is pending or the loop was stopped)
    pub fn start(&mut self) {
        if self.stop.is_stopped() || self.pending.is_some() {
            return;
        }
        self.pending = Some(self.host.schedule_frame());
    }

    /// Host callback for a fired frame. Steps the field once and schedules the
    /// next frame. Returns false for stale handles and after a stop.
    pub fn on_frame(&mut self, handle: H::Handle, field: &mut GlyphField) -> bool {
        if self.pending != Some(handle) {
            return false;
        }
        self.pending = None;

        if self.stop.is_stopped() {
            self.last_timestamp = None;
            return false;
        }

        let now = self.host.now();
        if let Some(last) = self.last_timestamp {
            let dt_ms = now - last;
            if dt_ms > 0.0 {
                field.step((dt_ms / 1000.0) as f32);
            }
        }
        self.last_timestamp = Some(now);

        self.pending = Some(self.host.schedule_frame());
        true
    }

    /// Cancel the pending frame, rebuild the field for `viewport` and resume
    pub fn resize(&mut self, field: &mut GlyphField, viewport: Viewport) {
        self.cancel_pending();
        field.resize(viewport);
        self.last_timestamp = None;
        self.start();
    }

    /// Forget the last timestamp so the next frame does not integrate a pause
    pub fn reset_clock(&mut self) {
        self.last_timestamp = None;
    }

    /// Halt the loop and withdraw any scheduled frame
    pub fn stop(&mut self) {
        self.stop.stop();
        self.sync_stop();
    }

    /// Apply a stop requested through a cloned [`StopHandle`]
    pub fn sync_stop(&mut self) {
        if self.stop.is_stopped() {
            self.cancel_pending();
            self.last_timestamp = None;
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.host.cancel_frame(handle);
        }
    }
}

impl<H: FrameHost> Drop for FrameDriver<H> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyph_core::{Mode, SimConfig};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Scripted host: frames fire only when the test says so
    #[derive(Default)]
    struct ManualHost {
        clock_ms: f64,
        next: u32,
        scheduled: Vec<u32>,
        cancelled: Rc<RefCell<Vec<u32>>>,
    }

    impl FrameHost for ManualHost {
        type Handle = u32;

        fn schedule_frame(&mut self) -> u32 {
            self.next += 1;
            self.scheduled.push(self.next);
            self.next
        }

        fn cancel_frame(&mut self, handle: u32) {
            self.scheduled.retain(|&h| h != handle);
            self.cancelled.borrow_mut().push(handle);
        }

        fn now(&self) -> f64 {
            self.clock_ms
        }
    }

    /// Advance the clock and fire the oldest scheduled frame
    fn fire(driver: &mut FrameDriver<ManualHost>, field: &mut GlyphField, ms: f64) -> bool {
        driver.host_mut().clock_ms += ms;
        if driver.host().scheduled.is_empty() {
            return false;
        }
        let handle = driver.host_mut().scheduled.remove(0);
        driver.on_frame(handle, field)
    }

    fn field() -> GlyphField {
        GlyphField::new(SimConfig::preset(Mode::Molecular), Viewport::new(400.0, 300.0, 1.0))
    }

    #[test]
    fn test_frames_step_the_field() {
        let mut field = field();
        let mut driver = FrameDriver::new(ManualHost::default());
        driver.start();

        assert!(fire(&mut driver, &mut field, 16.0));
        // First frame only records the timestamp
        assert_eq!(field.frame(), 0);
        assert!(fire(&mut driver, &mut field, 16.0));
        assert!(fire(&mut driver, &mut field, 16.0));
        assert_eq!(field.frame(), 2);
        assert!(driver.is_running());
        assert_eq!(driver.host().scheduled.len(), 1);
    }

    #[test]
    fn test_stop_leaves_nothing_scheduled() {
        let mut field = field();
        let mut driver = FrameDriver::new(ManualHost::default());
        driver.start();
        fire(&mut driver, &mut field, 16.0);

        driver.stop();
        assert!(driver.host().scheduled.is_empty());
        assert_eq!(driver.pending(), None);
        assert!(!fire(&mut driver, &mut field, 16.0));

        // A stopped loop cannot be restarted by accident
        driver.start();
        assert!(driver.host().scheduled.is_empty());
    }

    #[test]
    fn test_external_stop_handle_halts_loop() {
        let mut field = field();
        let mut driver = FrameDriver::new(ManualHost::default());
        let handle = driver.stop_handle();
        driver.start();
        fire(&mut driver, &mut field, 16.0);
        let frames = field.frame();

        handle.stop();
        assert!(!fire(&mut driver, &mut field, 16.0));
        assert_eq!(field.frame(), frames);
        assert!(driver.host().scheduled.is_empty());
        assert!(!driver.is_running());
    }

    #[test]
    fn test_resize_cancels_pending_and_resets() {
        let mut field = field();
        let mut driver = FrameDriver::new(ManualHost::default());
        driver.start();
        for _ in 0..120 {
            fire(&mut driver, &mut field, 16.0);
        }
        let stale = driver.pending().expect("pending frame");

        driver.resize(&mut field, Viewport::new(800.0, 600.0, 2.0));
        assert!(driver.host().cancelled.borrow().contains(&stale));
        assert!(field.bonds().is_empty());
        assert_eq!(field.viewport().width, 800.0);

        // The cancelled handle no longer drives anything
        assert!(!driver.on_frame(stale, &mut field));
        assert!(driver.is_running());
    }

    #[test]
    fn test_drop_cancels_pending_frame() {
        let cancelled = Rc::new(RefCell::new(Vec::new()));
        let host = ManualHost { cancelled: cancelled.clone(), ..ManualHost::default() };
        let mut driver = FrameDriver::new(host);
        driver.start();
        let pending = driver.pending().expect("pending frame");

        drop(driver);
        assert_eq!(*cancelled.borrow(), vec![pending]);
    }

    #[test]
    fn test_long_stall_is_clamped() {
        let mut field = field();
        let mut driver = FrameDriver::new(ManualHost::default());
        driver.start();
        fire(&mut driver, &mut field, 16.0);
        let before: Vec<[f32; 2]> = field.particles().iter().map(|p| p.position).collect();

        // Ten seconds in the background
        fire(&mut driver, &mut field, 10_000.0);
        for (p, old) in field.particles().iter().zip(&before) {
            let moved = ((p.position[0] - old[0]).powi(2) + (p.position[1] - old[1]).powi(2)).sqrt();
            // Either integrated a clamped step or wrapped/respawned
            assert!(moved.is_finite());
        }
        assert!((field.elapsed() - 10.0).abs() < 1e-3);
    }
}
