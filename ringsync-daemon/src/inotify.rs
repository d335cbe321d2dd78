//! Linux backend: one inotify instance per monitoring group, multiplexed
//! with `poll(2)`.

use std::io;
use std::os::fd::AsFd;
use std::path::Path;
use std::time::Duration;

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::inotify::{AddWatchFlags, InitFlags, Inotify, WatchDescriptor};

use crate::notifier::{ChangeEvent, ChangeKind, Notifier};

#[derive(Debug, Clone, Copy)]
pub struct InotifyNotifier {
    mask: AddWatchFlags,
}

impl InotifyNotifier {
    /// `follow_writes` additionally reports files written in place.
    pub fn new(follow_writes: bool) -> Self {
        let mut mask = AddWatchFlags::IN_DELETE_SELF;
        if follow_writes {
            mask |= AddWatchFlags::IN_CLOSE_WRITE;
        }
        Self { mask }
    }
}

impl Notifier for InotifyNotifier {
    type Source = Inotify;
    type Watch = WatchDescriptor;

    fn create_source(&mut self) -> io::Result<Inotify> {
        Ok(Inotify::init(InitFlags::IN_CLOEXEC)?)
    }

    fn watch(&mut self, source: &Inotify, path: &Path) -> io::Result<WatchDescriptor> {
        Ok(source.add_watch(path, self.mask)?)
    }

    fn unwatch(&mut self, source: &Inotify, watch: WatchDescriptor) -> io::Result<()> {
        Ok(source.rm_watch(watch)?)
    }

    fn wait_any(
        &mut self,
        sources: &[&Inotify],
        timeout: Option<Duration>,
    ) -> io::Result<Vec<usize>> {
        let timeout = match timeout {
            None => PollTimeout::NONE,
            Some(limit) => PollTimeout::try_from(limit).unwrap_or(PollTimeout::MAX),
        };
        let mut fds: Vec<PollFd<'_>> = sources
            .iter()
            .map(|source| PollFd::new(source.as_fd(), PollFlags::POLLIN))
            .collect();

        loop {
            match poll(&mut fds, timeout) {
                Ok(_) => break,
                Err(Errno::EINTR) => {
                    tracing::debug!("poll interrupted by a signal, retrying");
                }
                Err(errno) => return Err(errno.into()),
            }
        }

        Ok(fds
            .iter()
            .enumerate()
            .filter(|(_, fd)| fd.revents().is_some_and(|revents| !revents.is_empty()))
            .map(|(idx, _)| idx)
            .collect())
    }

    fn read_events(&mut self, source: &Inotify) -> io::Result<Vec<ChangeEvent<WatchDescriptor>>> {
        let events = source.read_events()?;
        Ok(events
            .into_iter()
            .map(|event| ChangeEvent {
                watch: event.wd,
                kind: classify(event.mask),
            })
            .collect())
    }
}

fn classify(mask: AddWatchFlags) -> ChangeKind {
    if mask.contains(AddWatchFlags::IN_Q_OVERFLOW) {
        ChangeKind::Overflow
    } else if mask.contains(AddWatchFlags::IN_DELETE_SELF) {
        ChangeKind::Removed
    } else if mask.contains(AddWatchFlags::IN_CLOSE_WRITE) {
        ChangeKind::Written
    } else {
        ChangeKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn classify_maps_masks() {
        assert_eq!(classify(AddWatchFlags::IN_DELETE_SELF), ChangeKind::Removed);
        assert_eq!(classify(AddWatchFlags::IN_CLOSE_WRITE), ChangeKind::Written);
        assert_eq!(classify(AddWatchFlags::IN_Q_OVERFLOW), ChangeKind::Overflow);
        assert_eq!(classify(AddWatchFlags::IN_IGNORED), ChangeKind::Other);
    }

    #[test]
    fn watching_a_missing_path_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let mut notifier = InotifyNotifier::new(false);
        let source = notifier.create_source().unwrap();
        let err = notifier
            .watch(&source, &tmp.path().join("absent"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn interrupted_wait_is_retried() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::mpsc;
        use std::thread;

        use nix::sys::pthread::{pthread_kill, pthread_self};
        use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

        static DELIVERED: AtomicBool = AtomicBool::new(false);
        extern "C" fn note_delivery(_: nix::libc::c_int) {
            DELIVERED.store(true, Ordering::SeqCst);
        }

        // No SA_RESTART: the signal surfaces as EINTR from poll.
        let action = SigAction::new(
            SigHandler::Handler(note_delivery),
            SaFlags::empty(),
            SigSet::empty(),
        );
        unsafe { sigaction(Signal::SIGUSR1, &action) }.unwrap();

        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("watched");
        std::fs::write(&file, "x").unwrap();

        let (tx, rx) = mpsc::channel();
        let watched = file.clone();
        let waiter = thread::spawn(move || {
            let mut notifier = InotifyNotifier::new(false);
            let source = notifier.create_source().unwrap();
            notifier.watch(&source, &watched).unwrap();
            tx.send(pthread_self()).unwrap();
            let ready = notifier.wait_any(&[&source], Some(Duration::from_secs(10)));
            (ready, notifier.read_events(&source))
        });

        let polling = rx.recv().unwrap();
        thread::sleep(Duration::from_millis(100));
        pthread_kill(polling, Signal::SIGUSR1).unwrap();
        thread::sleep(Duration::from_millis(100));
        std::fs::remove_file(&file).unwrap();

        let (ready, events) = waiter.join().unwrap();
        assert!(DELIVERED.load(Ordering::SeqCst));
        assert_eq!(ready.expect("wait survives the signal"), vec![0]);
        assert_eq!(events.unwrap()[0].kind, ChangeKind::Removed);
    }

    #[test]
    fn removal_wakes_only_the_owning_source() {
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("first");
        let second = tmp.path().join("second");
        std::fs::write(&first, "1").unwrap();
        std::fs::write(&second, "2").unwrap();

        let mut notifier = InotifyNotifier::new(false);
        let a = notifier.create_source().unwrap();
        let b = notifier.create_source().unwrap();
        let wd = notifier.watch(&a, &first).unwrap();
        notifier.watch(&b, &second).unwrap();

        assert!(notifier
            .wait_any(&[&a, &b], Some(Duration::from_millis(10)))
            .unwrap()
            .is_empty());

        std::fs::remove_file(&first).unwrap();
        let ready = notifier
            .wait_any(&[&a, &b], Some(Duration::from_secs(5)))
            .unwrap();
        assert_eq!(ready, vec![0]);

        let events = notifier.read_events(&a).unwrap();
        assert_eq!(
            events.first(),
            Some(&ChangeEvent {
                watch: wd,
                kind: ChangeKind::Removed
            })
        );
    }
}
