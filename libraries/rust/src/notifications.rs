//! Transient status notifications.
//!
//! Each toast counts down from its duration and disappears when the time is
//! used up. Pausing a toast (for example while it is hovered) freezes the
//! countdown; resuming continues from the time that was left. The current
//! time is always passed in, so expiry depends only on elapsed time.

use std::time::{Duration, Instant};

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToastVariant {
    #[default]
    Default,
    Success,
    Destructive,
}

impl ToastVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastVariant::Default => "default",
            ToastVariant::Success => "success",
            ToastVariant::Destructive => "destructive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub variant: ToastVariant,
    pub title: String,
    pub description: Option<String>,
    /// Optional link the toast points at, such as an explorer URL
    pub link: Option<String>,
    /// Zero means the toast stays until dismissed
    pub duration: Duration,
    /// Time left as of `running_since`, or as of the pause
    remaining: Duration,
    /// `None` while paused
    running_since: Option<Instant>,
}

impl Toast {
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.running_since {
            Some(since) => self
                .remaining
                .saturating_sub(now.saturating_duration_since(since)),
            None => self.remaining,
        }
    }

    pub fn is_sticky(&self) -> bool {
        self.duration.is_zero()
    }

    pub fn is_paused(&self) -> bool {
        self.running_since.is_none()
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        !self.is_sticky() && self.remaining(now).is_zero()
    }

    /// Fraction of the duration still left, from 1.0 down to 0.0
    pub fn progress(&self, now: Instant) -> f32 {
        if self.is_sticky() {
            return 1.0;
        }
        self.remaining(now).as_secs_f32() / self.duration.as_secs_f32()
    }

    fn pause(&mut self, now: Instant) -> bool {
        if self.running_since.is_none() {
            return false;
        }
        self.remaining = self.remaining(now);
        self.running_since = None;
        true
    }

    fn resume(&mut self, now: Instant) -> bool {
        if self.running_since.is_some() {
            return false;
        }
        self.running_since = Some(now);
        true
    }
}

/// A queue of toasts with monotonically increasing ids.
#[derive(Debug, Default)]
pub struct Notifications {
    next_id: u64,
    toasts: Vec<Toast>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        now: Instant,
        variant: ToastVariant,
        title: impl Into<String>,
        description: Option<String>,
    ) -> u64 {
        self.push_with(now, variant, title, description, None, DEFAULT_TOAST_DURATION)
    }

    pub fn push_with(
        &mut self,
        now: Instant,
        variant: ToastVariant,
        title: impl Into<String>,
        description: Option<String>,
        link: Option<String>,
        duration: Duration,
    ) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.toasts.push(Toast {
            id,
            variant,
            title: title.into(),
            description,
            link,
            duration,
            remaining: duration,
            running_since: Some(now),
        });
        id
    }

    pub fn success(&mut self, now: Instant, title: impl Into<String>, link: Option<String>) -> u64 {
        self.push_with(
            now,
            ToastVariant::Success,
            title,
            None,
            link,
            DEFAULT_TOAST_DURATION,
        )
    }

    pub fn error(&mut self, now: Instant, title: impl Into<String>, description: String) -> u64 {
        self.push(now, ToastVariant::Destructive, title, Some(description))
    }

    pub fn get(&self, id: u64) -> Option<&Toast> {
        self.toasts.iter().find(|toast| toast.id == id)
    }

    /// Freeze the countdown. Returns false for unknown or already paused toasts.
    pub fn pause(&mut self, id: u64, now: Instant) -> bool {
        self.toasts
            .iter_mut()
            .find(|toast| toast.id == id)
            .map_or(false, |toast| toast.pause(now))
    }

    /// Continue the countdown from where it was paused.
    pub fn resume(&mut self, id: u64, now: Instant) -> bool {
        self.toasts
            .iter_mut()
            .find(|toast| toast.id == id)
            .map_or(false, |toast| toast.resume(now))
    }

    pub fn dismiss(&mut self, id: u64) -> Option<Toast> {
        let position = self.toasts.iter().position(|toast| toast.id == id)?;
        Some(self.toasts.remove(position))
    }

    /// Remove and return every toast whose time has run out.
    pub fn expire(&mut self, now: Instant) -> Vec<Toast> {
        let (expired, live) = std::mem::take(&mut self.toasts)
            .into_iter()
            .partition(|toast| toast.is_expired(now));
        self.toasts = live;
        expired
    }

    /// Toasts still showing at `now`, oldest first
    pub fn active(&self, now: Instant) -> impl Iterator<Item = &Toast> {
        self.toasts.iter().filter(move |toast| !toast.is_expired(now))
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn ids_are_monotonic() {
        let now = Instant::now();
        let mut queue = Notifications::new();
        let first = queue.push(now, ToastVariant::Default, "a", None);
        let second = queue.push(now, ToastVariant::Default, "b", None);
        queue.dismiss(second);
        let third = queue.push(now, ToastVariant::Default, "c", None);
        assert!(first < second && second < third);
    }

    #[test]
    fn toasts_expire_after_their_duration() {
        let start = Instant::now();
        let mut queue = Notifications::new();
        let id = queue.push(start, ToastVariant::Success, "done", None);

        assert!(queue.expire(start + secs(4)).is_empty());
        let toast = queue.get(id).unwrap();
        assert_eq!(toast.remaining(start + secs(4)), secs(1));
        assert!((toast.progress(start + secs(4)) - 0.2).abs() < 1e-6);

        let expired = queue.expire(start + secs(5));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, id);
        assert!(queue.is_empty());
    }

    #[test]
    fn paused_toasts_keep_their_remaining_time() {
        let start = Instant::now();
        let mut queue = Notifications::new();
        let id = queue.push(start, ToastVariant::Default, "hover me", None);

        assert!(queue.pause(id, start + secs(2)));
        assert!(!queue.pause(id, start + secs(2)));
        // time passes while paused
        assert!(queue.expire(start + secs(60)).is_empty());
        assert_eq!(queue.get(id).unwrap().remaining(start + secs(60)), secs(3));

        assert!(queue.resume(id, start + secs(60)));
        assert!(queue.expire(start + secs(62)).is_empty());
        assert_eq!(queue.expire(start + secs(63)).len(), 1);
    }

    #[test]
    fn sticky_toasts_stay_until_dismissed() {
        let start = Instant::now();
        let mut queue = Notifications::new();
        let id = queue.push_with(
            start,
            ToastVariant::Destructive,
            "failed",
            Some("rpc unreachable".into()),
            None,
            Duration::ZERO,
        );
        assert!(queue.expire(start + secs(3600)).is_empty());
        assert_eq!(queue.get(id).unwrap().progress(start + secs(3600)), 1.0);
        assert_eq!(queue.dismiss(id).map(|toast| toast.title), Some("failed".into()));
        assert!(queue.dismiss(id).is_none());
    }

    #[test]
    fn active_hides_expired_but_unswept_toasts() {
        let start = Instant::now();
        let mut queue = Notifications::new();
        queue.push_with(start, ToastVariant::Default, "short", None, None, secs(1));
        queue.push(start, ToastVariant::Default, "long", None);
        let titles = queue
            .active(start + secs(2))
            .map(|toast| toast.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["long"]);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut queue = Notifications::new();
        let now = Instant::now();
        assert!(!queue.pause(7, now));
        assert!(!queue.resume(7, now));
    }
}
