use crate::runtime::task::Task;

use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::sync::Arc;
use std::task::{RawWaker, RawWakerVTable, Waker};

/// Per-output-type waker vtable.
///
/// Held in an associated constant so that `&TaskVTable::<T>::VTABLE`
/// is promoted to a `'static` reference for every `T`.
struct TaskVTable<T>(PhantomData<T>);

impl<T: Send + 'static> TaskVTable<T> {
    const VTABLE: RawWakerVTable = RawWakerVTable::new(
        clone_raw::<T>,
        wake_raw::<T>,
        wake_by_ref_raw::<T>,
        drop_raw::<T>,
    );

    fn raw(task: Arc<Task<T>>) -> RawWaker {
        RawWaker::new(Arc::into_raw(task).cast(), &Self::VTABLE)
    }
}

/// Creates a [`Waker`] that reschedules `task` when woken.
///
/// The waker owns one strong count of `task`.
pub(crate) fn make_waker<T: Send + 'static>(task: Arc<Task<T>>) -> Waker {
    // SAFETY: the data pointer comes from `Arc::into_raw` and every vtable
    // entry below keeps the strong count balanced.
    unsafe { Waker::from_raw(TaskVTable::raw(task)) }
}

/// Reclaims the waker's strong count.
///
/// # Safety
///
/// `ptr` must come from [`TaskVTable::raw`] for the same `T`.
unsafe fn owned<T>(ptr: *const ()) -> Arc<Task<T>> {
    unsafe { Arc::from_raw(ptr.cast()) }
}

/// Views the waker's task without touching its strong count.
///
/// # Safety
///
/// Same as [`owned`].
unsafe fn borrowed<T>(ptr: *const ()) -> ManuallyDrop<Arc<Task<T>>> {
    ManuallyDrop::new(unsafe { owned(ptr) })
}

fn clone_raw<T: Send + 'static>(ptr: *const ()) -> RawWaker {
    let task = unsafe { borrowed::<T>(ptr) };
    TaskVTable::raw(Arc::clone(&*task))
}

fn wake_raw<T: Send + 'static>(ptr: *const ()) {
    unsafe { owned::<T>(ptr) }.wake();
}

fn wake_by_ref_raw<T: Send + 'static>(ptr: *const ()) {
    let task = unsafe { borrowed::<T>(ptr) };
    Arc::clone(&*task).wake();
}

fn drop_raw<T: Send + 'static>(ptr: *const ()) {
    drop(unsafe { owned::<T>(ptr) });
}
