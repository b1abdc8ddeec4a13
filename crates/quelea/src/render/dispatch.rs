//! Getting work onto the render thread.
//!
//! Only the thread that owns the [`Inbox`] may touch surfaces. Everyone else
//! holds a [`Marshal`], which queues a value and wakes the UI so the next
//! frame picks it up.

use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::Arc;

use eframe::egui;

use crate::displayable::Displayable;
use crate::theme::Theme;

/// Requests the coordinator applies in arrival order.
#[derive(Debug, Clone)]
pub enum Command {
    SetDisplayable {
        displayable: Option<Arc<Displayable>>,
        section: usize,
    },
    /// Temporary schedule-wide theme override; `None` removes it.
    SetTheme(Option<Theme>),
    SetBlacked(bool),
    SetCleared(bool),
    Restore,
    SetLogo(bool),
    SetNotice(Option<String>),
}

/// Marker that makes a type `!Send` and `!Sync`.
pub(crate) type RenderThreadOnly = PhantomData<*const ()>;

/// Sending half, usable from any thread.
pub struct Marshal<T> {
    tx: flume::Sender<T>,
    waker: Option<egui::Context>,
}

impl<T> Clone for Marshal<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            waker: self.waker.clone(),
        }
    }
}

impl<T> Marshal<T> {
    /// Wake this context whenever something is sent.
    pub fn with_waker(mut self, ctx: egui::Context) -> Self {
        self.waker = Some(ctx);
        self
    }

    /// Queue `value` for the render thread. Returns `false` once the inbox is
    /// gone, i.e. the window has closed.
    pub fn send(&self, value: T) -> bool {
        if self.tx.send(value).is_err() {
            return false;
        }
        if let Some(ctx) = &self.waker {
            ctx.request_repaint();
        }
        true
    }
}

/// Receiving half, pinned to the thread that created it.
pub struct Inbox<T> {
    rx: flume::Receiver<T>,
    _render_thread: RenderThreadOnly,
}

impl<T> Inbox<T> {
    /// Everything queued so far, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.rx.try_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Create a marshal/inbox pair. Call this on the render thread.
pub fn channel<T>() -> (Marshal<T>, Inbox<T>) {
    let (tx, rx) = flume::unbounded();
    (
        Marshal { tx, waker: None },
        Inbox {
            rx,
            _render_thread: PhantomData,
        },
    )
}

/// Holds work back until some one-shot condition is met, then releases it
/// all in submission order. After that, work runs immediately.
#[derive(Debug)]
pub struct ReadyQueue<T> {
    ready: bool,
    queued: VecDeque<T>,
}

impl<T> Default for ReadyQueue<T> {
    fn default() -> Self {
        Self {
            ready: false,
            queued: VecDeque::new(),
        }
    }
}

impl<T> ReadyQueue<T> {
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Hand back `item` to run now if ready, otherwise keep it.
    pub fn submit(&mut self, item: T) -> Option<T> {
        if self.ready {
            Some(item)
        } else {
            self.queued.push_back(item);
            None
        }
    }

    /// Flip to ready and return everything that was waiting. Later calls
    /// return nothing.
    pub fn mark_ready(&mut self) -> Vec<T> {
        self.ready = true;
        self.queued.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }
}
