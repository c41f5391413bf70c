//! Linux `epoll`-based poller.
//!
//! The reactor only needs two things from the OS: a wait with a timeout
//! and a way for other threads to interrupt that wait. Both are provided
//! by an `epoll` instance watching a single non-blocking `eventfd`.
//!
//! This backend is selected automatically on Linux targets.

use libc::{
    EFD_CLOEXEC, EFD_NONBLOCK, EPOLL_CLOEXEC, EPOLL_CTL_ADD, EPOLLIN, close, epoll_create1,
    epoll_ctl, epoll_event, epoll_wait, eventfd, read, write,
};
use std::io;
use std::os::fd::RawFd;
use std::sync::Arc;
use std::time::Duration;

/// Token identifying the wake-up `eventfd` inside the epoll set.
const WAKE_TOKEN: u64 = u64::MAX;

/// Wake-up handle wrapping the poller's `eventfd`.
///
/// Writing to the descriptor makes a blocked `epoll_wait` return
/// immediately.
pub(crate) struct Waker(RawFd);

impl Waker {
    /// Interrupts the reactor's current wait.
    pub(crate) fn wake(&self) {
        let buf: u64 = 1;
        unsafe {
            write(self.0, &buf as *const u64 as *const _, 8);
        }
    }

    /// Resets the counter so the next wait blocks again.
    fn drain(&self) {
        let mut buf = 0u64;
        unsafe {
            read(self.0, &mut buf as *mut u64 as *mut _, 8);
        }
    }
}

impl Drop for Waker {
    fn drop(&mut self) {
        unsafe { close(self.0) };
    }
}

/// Linux `epoll` poller.
pub(crate) struct EpollPoller {
    /// Epoll file descriptor.
    epoll: RawFd,

    /// Reusable event buffer; only the wake-up descriptor is ever ready.
    events: Vec<epoll_event>,

    /// Waker wrapping the internal eventfd.
    waker: Arc<Waker>,
}

impl EpollPoller {
    /// Creates the epoll instance and registers the wake-up `eventfd`
    /// as a persistent source.
    pub(crate) fn new() -> io::Result<Self> {
        let epoll = unsafe { epoll_create1(EPOLL_CLOEXEC) };
        if epoll < 0 {
            return Err(io::Error::last_os_error());
        }

        let fd = unsafe { eventfd(0, EFD_NONBLOCK | EFD_CLOEXEC) };
        if fd < 0 {
            let err = io::Error::last_os_error();
            unsafe { close(epoll) };
            return Err(err);
        }

        let waker = Arc::new(Waker(fd));

        let mut event = epoll_event {
            events: EPOLLIN as u32,
            u64: WAKE_TOKEN,
        };

        let rc = unsafe { epoll_ctl(epoll, EPOLL_CTL_ADD, fd, &mut event) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            unsafe { close(epoll) };
            return Err(err);
        }

        Ok(Self {
            epoll,
            events: Vec::with_capacity(4),
            waker,
        })
    }

    /// Returns the wake-up handle shared with reactor handles.
    pub(crate) fn waker(&self) -> Arc<Waker> {
        self.waker.clone()
    }

    /// Blocks until the timeout expires or the waker fires.
    ///
    /// `None` waits indefinitely. The timeout is rounded **up** to whole
    /// milliseconds so the reactor never wakes before a deadline and
    /// spins until it is reached.
    pub(crate) fn wait(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        let timeout_ms = timeout
            .map(|t| t.as_nanos().div_ceil(1_000_000).min(i32::MAX as u128) as i32)
            .unwrap_or(-1);

        let n = unsafe {
            epoll_wait(
                self.epoll,
                self.events.as_mut_ptr(),
                self.events.capacity() as i32,
                timeout_ms,
            )
        };

        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(err);
        }

        unsafe {
            self.events.set_len(n as usize);
        }

        // `epoll_event` is packed on some targets: copy the field out.
        if self.events.iter().any(|ev| {
            let token = ev.u64;
            token == WAKE_TOKEN
        }) {
            self.waker.drain();
        }

        self.events.clear();

        Ok(())
    }
}

impl Drop for EpollPoller {
    fn drop(&mut self) {
        unsafe { close(self.epoll) };
    }
}
