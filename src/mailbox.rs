//! Single-slot frame handoff from interrupt to main context.
//!
//! At most one completed [`Frame`] is in flight: the receiver goes IDLE after
//! each frame and is only re-armed by the consumer. If the consumer is slow and
//! a second frame is posted anyway, the [`OverwritePolicy`] decides which one
//! survives, and the loss is counted instead of happening silently.
//!
//! Both sides touch the slot only inside a `critical_section`, so the mailbox
//! can live in a `static`.

use core::cell::Cell;
use core::convert::Infallible;

use critical_section::Mutex;

use crate::frame::Frame;

/// What to do with a new frame when the slot is still occupied.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum OverwritePolicy {
    /// The newest frame replaces the unread one.
    #[default]
    Overwrite,
    /// The unread frame is kept and the new one is rejected.
    KeepOldest,
}

/// Outcome of [`FrameMailbox::post`].
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum PostOutcome {
    /// The slot was empty.
    Delivered,
    /// An unread frame was replaced.
    Replaced,
    /// The slot was full and the new frame was dropped.
    Rejected,
}

impl PostOutcome {
    /// Whether a frame was lost by this post.
    pub fn lost_frame(&self) -> bool {
        *self != PostOutcome::Delivered
    }
}

/// A one-frame mailbox.
#[derive(Debug)]
pub struct FrameMailbox {
    slot: Mutex<Cell<Option<Frame>>>,
    lost: Mutex<Cell<u16>>,
    policy: OverwritePolicy,
}

impl Default for FrameMailbox {
    fn default() -> Self {
        Self::new(OverwritePolicy::default())
    }
}

impl FrameMailbox {
    /// Creates an empty mailbox.
    pub const fn new(policy: OverwritePolicy) -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
            lost: Mutex::new(Cell::new(0)),
            policy,
        }
    }

    /// The policy applied when the slot is full.
    pub const fn policy(&self) -> OverwritePolicy {
        self.policy
    }

    /// Offers a completed frame to the consumer.
    pub fn post(&self, frame: Frame) -> PostOutcome {
        let outcome = critical_section::with(|cs| {
            let slot = self.slot.borrow(cs);
            let outcome = match (slot.take(), self.policy) {
                (None, _) => {
                    slot.set(Some(frame));
                    PostOutcome::Delivered
                }
                (Some(_), OverwritePolicy::Overwrite) => {
                    slot.set(Some(frame));
                    PostOutcome::Replaced
                }
                (Some(old), OverwritePolicy::KeepOldest) => {
                    slot.set(Some(old));
                    PostOutcome::Rejected
                }
            };
            if outcome.lost_frame() {
                let lost = self.lost.borrow(cs);
                lost.set(lost.get().wrapping_add(1));
            }
            outcome
        });
        if outcome.lost_frame() {
            warn!("unread frame lost: {:?}", outcome);
        }
        outcome
    }

    /// Takes the pending frame, if any.
    ///
    /// # Returns
    /// - `Ok(frame)`: the slot is now empty again
    /// - `Err(nb::Error::WouldBlock)`: nothing has been posted
    pub fn poll(&self) -> nb::Result<Frame, Infallible> {
        critical_section::with(|cs| self.slot.borrow(cs).take()).ok_or(nb::Error::WouldBlock)
    }

    /// Whether a frame is waiting, without taking it.
    pub fn is_ready(&self) -> bool {
        critical_section::with(|cs| self.slot.borrow(cs).get().is_some())
    }

    /// Number of frames lost to a full slot since creation.
    pub fn lost(&self) -> u16 {
        critical_section::with(|cs| self.lost.borrow(cs).get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_LEN;

    fn frame(tag: u8) -> Frame {
        Frame::from_bytes([tag; FRAME_LEN])
    }

    #[test]
    fn test_empty_would_block() {
        let mailbox = FrameMailbox::default();
        assert!(!mailbox.is_ready());
        assert_eq!(mailbox.poll(), Err(nb::Error::WouldBlock));
        assert_eq!(mailbox.lost(), 0);
    }

    #[test]
    fn test_post_then_poll_once() {
        let mailbox = FrameMailbox::new(OverwritePolicy::Overwrite);
        assert_eq!(mailbox.post(frame(1)), PostOutcome::Delivered);
        assert!(mailbox.is_ready());
        assert!(mailbox.is_ready());
        assert_eq!(mailbox.poll(), Ok(frame(1)));
        assert!(!mailbox.is_ready());
        assert_eq!(mailbox.poll(), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn test_overwrite_keeps_newest() {
        let mailbox = FrameMailbox::new(OverwritePolicy::Overwrite);
        let _ = mailbox.post(frame(1));
        assert_eq!(mailbox.post(frame(2)), PostOutcome::Replaced);
        assert_eq!(mailbox.lost(), 1);
        assert_eq!(mailbox.poll(), Ok(frame(2)));
    }

    #[test]
    fn test_keep_oldest_rejects_new() {
        let mailbox = FrameMailbox::new(OverwritePolicy::KeepOldest);
        let _ = mailbox.post(frame(1));
        assert_eq!(mailbox.post(frame(2)), PostOutcome::Rejected);
        assert_eq!(mailbox.post(frame(3)), PostOutcome::Rejected);
        assert_eq!(mailbox.lost(), 2);
        assert_eq!(mailbox.poll(), Ok(frame(1)));
    }

    #[test]
    fn test_static_mailbox() {
        static MAILBOX: FrameMailbox = FrameMailbox::new(OverwritePolicy::KeepOldest);
        assert_eq!(MAILBOX.policy(), OverwritePolicy::KeepOldest);
        assert_eq!(MAILBOX.post(frame(7)), PostOutcome::Delivered);
        assert_eq!(MAILBOX.poll(), Ok(frame(7)));
    }
}
