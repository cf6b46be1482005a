//! DOM Window object: the viewport, a manual clock and the task queues.

use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + Sync>;

/// Animation frame callback type; receives the frame timestamp in milliseconds.
pub type AnimationFrameCallback = Box<dyn FnOnce(f64) + Send + Sync>;

/// Shared FIFO of microtasks.
///
/// Cloning shares the queue, so listeners can enqueue work without holding
/// the document.
#[derive(Clone, Default)]
pub struct TaskQueue {
    tasks: Arc<Mutex<VecDeque<Task>>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, task: Task) {
        self.tasks.lock().push_back(task);
    }

    pub fn pop(&self) -> Option<Task> {
        self.tasks.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue").field("len", &self.len()).finish()
    }
}

/// Timer data.
struct Timer {
    callback: Task,
    due: Duration,
}

/// Window object.
pub struct Window {
    /// Inner dimensions.
    pub inner_width: u32,
    pub inner_height: u32,
    /// Time since the window was created; only moves when advanced.
    now: Duration,
    /// Timers.
    timers: BTreeMap<u32, Timer>,
    next_timer_id: u32,
    /// Animation frames, in request order.
    animation_frames: BTreeMap<u32, AnimationFrameCallback>,
    next_frame_id: u32,
    /// Microtasks.
    microtasks: TaskQueue,
}

impl Window {
    pub fn new() -> Self {
        Self {
            inner_width: 1920,
            inner_height: 1080,
            now: Duration::ZERO,
            timers: BTreeMap::new(),
            next_timer_id: 1,
            animation_frames: BTreeMap::new(),
            next_frame_id: 1,
            microtasks: TaskQueue::new(),
        }
    }

    /// Current time on the window clock.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Current time in milliseconds, the unit of `performance.now()`.
    pub fn now_ms(&self) -> f64 {
        self.now.as_secs_f64() * 1000.0
    }

    /// Move the clock forward.
    pub fn advance(&mut self, delta: Duration) {
        self.now += delta;
    }

    /// Set timeout.
    pub fn set_timeout(&mut self, callback: Task, delay: Duration) -> u32 {
        let id = self.next_timer_id;
        self.next_timer_id += 1;

        let timer = Timer {
            callback,
            due: self.now + delay,
        };

        self.timers.insert(id, timer);
        id
    }

    /// Clear timeout.
    pub fn clear_timeout(&mut self, id: u32) {
        self.timers.remove(&id);
    }

    /// Number of timers not yet fired.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Request animation frame.
    pub fn request_animation_frame(&mut self, callback: AnimationFrameCallback) -> u32 {
        let id = self.next_frame_id;
        self.next_frame_id += 1;
        self.animation_frames.insert(id, callback);
        id
    }

    /// Cancel animation frame.
    pub fn cancel_animation_frame(&mut self, id: u32) {
        self.animation_frames.remove(&id);
    }

    /// Whether any animation frame callback is waiting.
    pub fn has_animation_frames(&self) -> bool {
        !self.animation_frames.is_empty()
    }

    /// Take the timers that are due, earliest first.
    pub fn process_timers(&mut self) -> Vec<Task> {
        let now = self.now;
        let mut due: Vec<(Duration, u32)> = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.due <= now)
            .map(|(&id, timer)| (timer.due, id))
            .collect();
        due.sort();

        due.into_iter()
            .filter_map(|(_, id)| self.timers.remove(&id))
            .map(|timer| timer.callback)
            .collect()
    }

    /// Take every animation frame callback requested so far.
    pub fn process_animation_frames(&mut self) -> Vec<AnimationFrameCallback> {
        std::mem::take(&mut self.animation_frames).into_values().collect()
    }

    /// The microtask queue.
    pub fn microtasks(&self) -> &TaskQueue {
        &self.microtasks
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new()
    }
}
