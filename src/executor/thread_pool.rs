/// A pool of scoped worker threads for pass callbacks.
///
/// Uses `std::thread::scope`, so spawned work can borrow the frame and the
/// plan. The pool itself only bounds how many workers the executor keeps in
/// flight at once.
///
/// # Example
///
/// ```
/// use redlilium_framegraph::executor::ThreadPool;
///
/// let pool = ThreadPool::new(4);
///
/// let mut results = vec![0u32; 4];
/// pool.scope(|s| {
///     for (i, slot) in results.iter_mut().enumerate() {
///         s.spawn(move || {
///             *slot = (i as u32) * 10;
///         });
///     }
/// });
/// assert_eq!(results, vec![0, 10, 20, 30]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ThreadPool {
    num_threads: usize,
}

impl ThreadPool {
    /// Creates a pool that keeps at most `num_threads` workers busy.
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads: num_threads.max(1),
        }
    }

    /// Creates a pool sized to the number of available CPU cores.
    pub fn default_threads() -> Self {
        Self::new(std::thread::available_parallelism().map_or(1, |n| n.get()))
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Executes tasks within a scoped context.
    ///
    /// All tasks spawned within the closure complete before this method
    /// returns. A panic in a task is resumed here.
    pub fn scope<'env, F, R>(&self, f: F) -> R
    where
        F: for<'scope> FnOnce(&Scope<'scope, 'env>) -> R,
    {
        std::thread::scope(|s| {
            let scope = Scope { inner: s };
            f(&scope)
        })
    }
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::default_threads()
    }
}

/// A scope for spawning tasks that must complete before the scope exits.
pub struct Scope<'scope, 'env: 'scope> {
    inner: &'scope std::thread::Scope<'scope, 'env>,
}

impl<'scope, 'env> Scope<'scope, 'env> {
    /// Spawns a task on a new scoped thread.
    pub fn spawn<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'scope,
    {
        self.inner.spawn(f);
    }
}
