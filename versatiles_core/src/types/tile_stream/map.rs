//! Map transformation methods for TileStream.
//!
//! This module provides various `map` methods to transform tile data:
//!
//! | Method | Callback | Execution |
//! |--------|----------|-----------|
//! | `map` | `Fn(TileCoord, T) -> O` | sync, sequential |
//! | `map_try` | `Fn(TileCoord, T) -> Result<O>` | sync, sequential |
//! | `map_parallel` | `Fn(TileCoord, T) -> O` | sync, parallel |
//! | `map_parallel_try` | `Fn(TileCoord, T) -> Result<O>` | sync, parallel |
//! | `map_async` | `FnMut(TileCoord, T) -> impl Future<Output = O>` | async, sequential |
//! | `map_async_try` | `FnMut(TileCoord, T) -> impl Future<Output = Result<O>>` | async, sequential |
//! | `map_parallel_async` | `FnMut(TileCoord, T) -> impl Future<Output = O>` | async, parallel |
//! | `map_parallel_async_try` | `FnMut(TileCoord, T) -> impl Future<Output = Result<O>>` | async, parallel |

use super::{Arc, ConcurrencyLimits, Future, Result, StreamExt, TileCoord, TileStream};

impl<'a, T> TileStream<'a, T>
where
	T: Send + 'a,
{
	// -------------------------------------------------------------------------
	// Sync Sequential
	// -------------------------------------------------------------------------

	/// Transforms each tile using a synchronous callback.
	///
	/// Processes tiles sequentially in the order they arrive.
	///
	/// # Arguments
	/// * `callback` - Function that receives `(TileCoord, T)` and returns the transformed value.
	///
	/// # Examples
	/// ```
	/// # use versatiles_core::{TileCoord, Blob, TileStream};
	/// # async fn example() {
	/// let stream = TileStream::from_vec(vec![
	///     (TileCoord::new(0, 0, 0).unwrap(), Blob::from("data")),
	/// ]);
	///
	/// let mapped = stream.map(|coord, blob| {
	///     Blob::from(format!("level-{}: {}", coord.level, blob.as_str()))
	/// });
	///
	/// let items = mapped.to_vec().await;
	/// assert_eq!(items[0].1.as_str(), "level-0: data");
	/// # }
	/// ```
	pub fn map<F, O>(self, mut callback: F) -> TileStream<'a, O>
	where
		F: FnMut(TileCoord, T) -> O + Send + 'a,
		O: Send + 'a,
	{
		let s = self.inner.map(move |(coord, item)| (coord, callback(coord, item)));
		TileStream { inner: s.boxed() }
	}

	/// Transforms each tile using a fallible synchronous callback.
	///
	/// Processes tiles sequentially. If the callback returns an error, it is propagated
	/// as an item in the stream.
	///
	/// # Arguments
	/// * `callback` - Function that receives `(TileCoord, T)` and returns `Result<O>`.
	///
	/// # Examples
	/// ```
	/// # use versatiles_core::{TileCoord, Blob, TileStream};
	/// # use anyhow::Result;
	/// # async fn example() {
	/// let stream = TileStream::from_vec(vec![
	///     (TileCoord::new(0, 0, 0).unwrap(), Blob::from("data")),
	/// ]);
	///
	/// let mapped = stream.map_try(|coord, blob| -> Result<Blob> {
	///     Ok(Blob::from(format!("level-{}: {}", coord.level, blob.as_str())))
	/// });
	///
	/// let items = mapped.to_vec().await;
	/// assert!(items[0].1.is_ok());
	/// # }
	/// ```
	pub fn map_try<F, O>(self, mut callback: F) -> TileStream<'a, Result<O>>
	where
		F: FnMut(TileCoord, T) -> Result<O> + Send + 'a,
		O: Send + 'a,
	{
		let s = self.inner.map(move |(coord, item)| {
			let result = callback(coord, item);
			(
				coord,
				result.map_err(|e| e.context(format!("Failed to process tile at {coord:?}"))),
			)
		});
		TileStream { inner: s.boxed() }
	}

	// -------------------------------------------------------------------------
	// Sync Parallel
	// -------------------------------------------------------------------------

	/// Transforms each tile in parallel using a synchronous callback.
	///
	/// Spawns blocking tasks with CPU-bound concurrency limit. Order of results
	/// is not guaranteed.
	///
	/// # Arguments
	/// * `callback` - Function that receives `(TileCoord, T)` and returns the transformed value.
	///   Must be `Send + Sync + 'static` for parallel execution.
	///
	/// # Examples
	/// ```
	/// # use versatiles_core::{TileCoord, Blob, TileStream};
	/// # async fn example() {
	/// let stream = TileStream::from_vec(vec![
	///     (TileCoord::new(0, 0, 0).unwrap(), Blob::from("data0")),
	///     (TileCoord::new(1, 1, 1).unwrap(), Blob::from("data1")),
	/// ]);
	///
	/// let mapped = stream.map_parallel(|coord, blob| {
	///     // CPU-intensive transformation
	///     Blob::from(format!("processed-{}", blob.as_str()))
	/// });
	///
	/// let items = mapped.to_vec().await;
	/// assert_eq!(items.len(), 2);
	/// # }
	/// ```
	pub fn map_parallel<F, O>(self, callback: F) -> TileStream<'a, O>
	where
		F: Fn(TileCoord, T) -> O + Send + Sync + 'static,
		T: 'static,
		O: Send + 'static,
	{
		let arc_cb = Arc::new(callback);
		let limits = ConcurrencyLimits::default();
		let s = self
			.inner
			.map(move |(coord, item)| {
				let cb = Arc::clone(&arc_cb);
				tokio::task::spawn_blocking(move || (coord, cb(coord, item)))
			})
			.buffer_unordered(limits.cpu_bound)
			.map(|result| match result {
				Ok((coord, item)) => (coord, item),
				Err(e) => panic!("Spawned task panicked: {e}"),
			});
		TileStream { inner: s.boxed() }
	}

	/// Transforms each tile in parallel using a fallible synchronous callback.
	///
	/// Spawns blocking tasks with CPU-bound concurrency limit. If the callback returns
	/// an error, it is propagated as an item in the stream.
	///
	/// # Arguments
	/// * `callback` - Function that receives `(TileCoord, T)` and returns `Result<O>`.
	///   Must be `Send + Sync + 'static` for parallel execution.
	///
	/// # Examples
	/// ```
	/// # use versatiles_core::{TileCoord, Blob, TileStream};
	/// # use anyhow::Result;
	/// # async fn example() {
	/// let stream = TileStream::from_vec(vec![
	///     (TileCoord::new(0, 0, 0).unwrap(), Blob::from("data0")),
	///     (TileCoord::new(1, 1, 1).unwrap(), Blob::from("data1")),
	/// ]);
	///
	/// let mapped = stream.map_parallel_try(|coord, blob| -> Result<Blob> {
	///     Ok(Blob::from(format!("processed-{}", blob.as_str())))
	/// });
	///
	/// let items = mapped.to_vec().await;
	/// assert_eq!(items.len(), 2);
	/// # }
	/// ```
	pub fn map_parallel_try<F, O>(self, callback: F) -> TileStream<'a, Result<O>>
	where
		F: Fn(TileCoord, T) -> Result<O> + Send + Sync + 'static,
		T: 'static,
		O: Send + Sync + 'static,
	{
		let arc_cb = Arc::new(callback);
		let limits = ConcurrencyLimits::default();
		let s = self
			.inner
			.map(move |(coord, item)| {
				let cb = Arc::clone(&arc_cb);
				tokio::task::spawn_blocking(move || (coord, cb(coord, item)))
			})
			.buffer_unordered(limits.cpu_bound)
			.map(|result| match result {
				Ok((coord, Ok(item))) => (coord, Ok(item)),
				Ok((coord, Err(e))) => (coord, Err(e.context(format!("Failed to process tile at {coord:?}")))),
				Err(e) => panic!("Spawned task panicked: {e}"),
			});
		TileStream { inner: s.boxed() }
	}

	// -------------------------------------------------------------------------
	// Async Sequential
	// -------------------------------------------------------------------------

	/// Transforms each tile using an asynchronous callback, processing sequentially.
	///
	/// Each tile is processed one at a time, awaiting the callback before processing
	/// the next tile.
	///
	/// # Arguments
	/// * `callback` - Async function that receives `(TileCoord, T)` and returns the transformed value.
	///
	/// # Examples
	/// ```
	/// # use versatiles_core::{TileCoord, Blob, TileStream};
	/// # async fn example() {
	/// let stream = TileStream::from_vec(vec![
	///     (TileCoord::new(0, 0, 0).unwrap(), Blob::from("data")),
	/// ]);
	///
	/// let mapped = stream.map_async(|coord, blob| async move {
	///     // Async I/O operation
	///     Blob::from(format!("fetched-{}", blob.as_str()))
	/// });
	///
	/// let items = mapped.to_vec().await;
	/// assert_eq!(items[0].1.as_str(), "fetched-data");
	/// # }
	/// ```
	pub fn map_async<F, Fut, O>(self, mut callback: F) -> TileStream<'a, O>
	where
		F: FnMut(TileCoord, T) -> Fut + Send + 'a,
		Fut: Future<Output = O> + Send + 'a,
		O: Send + 'a,
	{
		let s = self.inner.then(move |(coord, item)| {
			let fut = callback(coord, item);
			async move { (coord, fut.await) }
		});
		TileStream { inner: s.boxed() }
	}

	/// Transforms each tile using a fallible asynchronous callback, processing sequentially.
	///
	/// Each tile is processed one at a time. If the callback returns an error, it is
	/// propagated as an item in the stream.
	///
	/// # Arguments
	/// * `callback` - Async function that receives `(TileCoord, T)` and returns `Result<O>`.
	///
	/// # Examples
	/// ```
	/// # use versatiles_core::{TileCoord, Blob, TileStream};
	/// # use anyhow::Result;
	/// # async fn example() {
	/// let stream = TileStream::from_vec(vec![
	///     (TileCoord::new(0, 0, 0).unwrap(), Blob::from("data")),
	/// ]);
	///
	/// let mapped = stream.map_async_try(|coord, blob| async move {
	///     Ok(Blob::from(format!("fetched-{}", blob.as_str())))
	/// });
	///
	/// let items = mapped.to_vec().await;
	/// assert!(items[0].1.is_ok());
	/// # }
	/// ```
	pub fn map_async_try<F, Fut, O>(self, mut callback: F) -> TileStream<'a, Result<O>>
	where
		F: FnMut(TileCoord, T) -> Fut + Send + 'a,
		Fut: Future<Output = Result<O>> + Send + 'a,
		O: Send + 'a,
	{
		let s = self.inner.then(move |(coord, item)| {
			let fut = callback(coord, item);
			async move {
				let result = fut.await;
				(
					coord,
					result.map_err(|e| e.context(format!("Failed to process tile at {coord:?}"))),
				)
			}
		});
		TileStream { inner: s.boxed() }
	}

	// -------------------------------------------------------------------------
	// Async Parallel
	// -------------------------------------------------------------------------

	/// Transforms each tile in parallel using an asynchronous callback.
	///
	/// Processes multiple tiles concurrently up to the CPU-bound concurrency limit.
	/// Order of results is not guaranteed.
	///
	/// # Arguments
	/// * `callback` - Async function that receives `(TileCoord, T)` and returns the transformed value.
	///
	/// # Examples
	/// ```
	/// # use versatiles_core::{TileCoord, Blob, TileStream};
	/// # use anyhow::Result;
	/// # use futures::StreamExt;
	/// # async fn example() {
	/// let stream = TileStream::from_vec(vec![
	///     (TileCoord::new(0, 0, 0).unwrap(), Blob::from("data0")),
	///     (TileCoord::new(1, 1, 1).unwrap(), Blob::from("data1")),
	/// ]);
	///
	/// let mapped = stream.map_parallel_async(|coord, blob| async move {
	///     tokio::time::sleep(std::time::Duration::from_millis(1)).await;
	///     Blob::from(format!("processed-{}-{}", coord.level, blob.as_str()))
	/// });
	///
	/// let items = mapped.to_vec().await;
	/// assert_eq!(items.len(), 2);
	/// # }
	/// ```
	pub fn map_parallel_async<F, Fut, O>(self, mut callback: F) -> TileStream<'a, O>
	where
		F: FnMut(TileCoord, T) -> Fut + Send + 'a,
		Fut: Future<Output = O> + Send + 'a,
		O: Send + 'a,
	{
		let limits = ConcurrencyLimits::default();
		let s = self
			.inner
			.map(move |(coord, item)| {
				let fut = callback(coord, item);
				async move { (coord, fut.await) }
			})
			.buffer_unordered(limits.cpu_bound);
		TileStream { inner: s.boxed() }
	}

	/// Transforms each tile in parallel using a fallible asynchronous callback.
	///
	/// Processes multiple tiles concurrently up to the CPU-bound concurrency limit.
	/// If the callback returns an error, it is propagated as an item in the stream.
	///
	/// # Arguments
	/// * `callback` - Async function that receives `(TileCoord, T)` and returns `Result<O>`.
	///
	/// # Examples
	/// ```
	/// # use versatiles_core::{TileCoord, Blob, TileStream};
	/// # use anyhow::Result;
	/// # async fn example() {
	/// let stream = TileStream::from_vec(vec![
	///     (TileCoord::new(0, 0, 0).unwrap(), Blob::from("data0")),
	///     (TileCoord::new(1, 1, 1).unwrap(), Blob::from("data1")),
	/// ]);
	///
	/// let mapped = stream.map_parallel_async_try(|coord, blob| async move {
	///     tokio::time::sleep(std::time::Duration::from_millis(1)).await;
	///     Ok(Blob::from(format!("processed-{}-{}", coord.level, blob.as_str())))
	/// });
	///
	/// let items = mapped.to_vec().await;
	/// assert_eq!(items.len(), 2);
	/// # }
	/// ```
	pub fn map_parallel_async_try<F, Fut, O>(self, mut callback: F) -> TileStream<'a, Result<O>>
	where
		F: FnMut(TileCoord, T) -> Fut + Send + 'a,
		Fut: Future<Output = Result<O>> + Send + 'a,
		O: Send + 'a,
	{
		let limits = ConcurrencyLimits::default();
		let s = self
			.inner
			.map(move |(coord, item)| {
				let fut = callback(coord, item);
				async move {
					let result = fut.await;
					(
						coord,
						result.map_err(|e| e.context(format!("Failed to process tile at {coord:?}"))),
					)
				}
			})
			.buffer_unordered(limits.cpu_bound);
		TileStream { inner: s.boxed() }
	}
}
