//! HTTP tile server
//!
//! This module provides the [`TileServer`] class for serving tiles and static
//! content over HTTP. The server supports hot-reloading of tile sources and
//! can serve multiple tile containers simultaneously.
//!
//! ## Features
//!
//! - **Multiple tile sources**: Serve different tile sets at different endpoints
//! - **Static file serving**: Serve static files from directories or TAR archives
//! - **Hot reload**: Add/remove sources without restarting the server
//! - **Compression support**: Automatic tile recompression based on client requests
//! - **TileJSON**: Automatic TileJSON metadata endpoints for each tile source
//!
//! ## URL Structure
//!
//! - Tiles: `/tiles/{name}/{z}/{x}/{y}` - Individual tiles
//! - TileJSON: `/tiles/{name}/tiles.json` - Metadata for tile source
//! - Static files: Served according to configured URL prefixes

use crate::{napi_result, runtime::create_runtime, tile_source::TileSource, types::ServerOptions};
use napi::bindgen_prelude::*;
use napi_derive::napi;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use versatiles::{config::Config, server::TileServer as RustTileServer};
use versatiles_container::{DataLocation, TileSource as RustTileSource, TilesRuntime};

// Type aliases for complex types
type TileSourceList = Mutex<HashMap<String, Arc<Box<dyn RustTileSource>>>>; // Map of name -> TileSource
type StaticSourceList = Mutex<Vec<(String, Option<String>)>>; // Vec of (path, url_prefix)

/// HTTP tile server for serving tiles and static content
///
/// A high-performance HTTP server for serving map tiles and static files.
/// Supports multiple tile sources with hot-reload capability, allowing you
/// to add or remove tile sources without restarting the server.
///
/// # URL Endpoints
///
/// When a tile source named "osm" is added, the following endpoints become available:
/// - `GET /tiles/osm/{z}/{x}/{y}` - Retrieve a tile
/// - `GET /tiles/osm/tiles.json` - TileJSON metadata
///
/// Static files are served according to their configured URL prefix.
///
/// # Examples
///
/// ```javascript
/// const server = new TileServer({ port: 8080 });
///
/// // Add tile sources
/// await server.addTileSource('osm', 'tiles/osm.versatiles');
/// await server.addTileSource('terrain', 'tiles/terrain.mbtiles');
///
/// // Add static content
/// await server.addStaticSource('public/', '/');
///
/// // Start the server
/// await server.start();
/// console.log(`Server running on port ${server.port}`);
///
/// // Hot reload: add more sources while running
/// await server.addTileSource('satellite', 'tiles/satellite.pmtiles');
///
/// // Clean up
/// await server.stop();
/// ```
#[napi]
pub struct TileServer {
	inner: Mutex<Option<RustTileServer>>,
	runtime: TilesRuntime,
	initial_port: u16,
	actual_port: Arc<RwLock<Option<u16>>>, // Cached actual bound port for sync access
	ip: String,
	minimal_recompression: Option<bool>,
	// Track accumulated sources to rebuild config on start
	tile_sources: TileSourceList,     // Map of name -> TileSource
	static_sources: StaticSourceList, // Vec of (path, url_prefix)
}

#[napi]
impl TileServer {
	/// Create a new tile server
	///
	/// Creates a new HTTP tile server with the specified configuration.
	/// The server is not started until `start()` is called.
	///
	/// # Arguments
	///
	/// * `options` - Optional server configuration
	///   - `ip`: IP address to bind to (default: "0.0.0.0")
	///   - `port`: Port to listen on (default: 8080)
	///   - `minimalRecompression`: Use minimal recompression for better performance (default: false)
	///
	/// # Examples
	///
	/// ```javascript
	/// // Default settings (0.0.0.0:8080)
	/// const server = new TileServer();
	///
	/// // Custom port
	/// const server = new TileServer({ port: 3000 });
	///
	/// // Custom IP and port with minimal recompression
	/// const server = new TileServer({
	///   ip: '127.0.0.1',
	///   port: 8080,
	///   minimalRecompression: true
	/// });
	/// ```
	#[napi(constructor)]
	pub fn new(options: Option<ServerOptions>) -> Result<Self> {
		let opts = options.unwrap_or(ServerOptions {
			ip: None,
			port: None,
			minimal_recompression: None,
		});

		let runtime = create_runtime();
		let ip = opts.ip.unwrap_or_else(|| "0.0.0.0".to_string());
		let initial_port = opts.port.unwrap_or(8080) as u16;
		let minimal_recompression = opts.minimal_recompression;

		Ok(Self {
			inner: Mutex::new(None),
			runtime,
			initial_port,
			actual_port: Arc::new(RwLock::new(None)),
			ip,
			minimal_recompression,
			tile_sources: Mutex::new(HashMap::new()),
			static_sources: Mutex::new(Vec::new()),
		})
	}

	/// Add a tile source to the server from a TileSource object
	///
	/// The tiles will be served at /tiles/{name}/...
	///
	/// This method supports all types of TileSources:
	/// - File-based sources (MBTiles, PMTiles, VersaTiles, TAR, directories)
	/// - VPL pipeline sources (e.g., filtered or transformed tiles)
	///
	/// All sources support hot reload and can be added before or after starting the server.
	/// Changes take effect immediately without requiring a server restart.
	///
	/// # Errors
	///
	/// Returns an error if a tile source with the given name already exists.
	#[napi]
	pub async fn add_tile_source(&self, name: String, source: &TileSource) -> Result<()> {
		let reader = source.reader();

		// Check for duplicate name and add to our map
		let mut sources = self.tile_sources.lock().await;
		if sources.contains_key(&name) {
			return Err(Error::from_reason(format!(
				"Tile source with name '{name}' already exists",
			)));
		}

		// If server is running, add to it for hot reload
		if let Some(server) = self.inner.lock().await.as_mut() {
			napi_result!(server.add_tile_source(name.clone(), Arc::clone(&reader)).await)?;
		}

		sources.insert(name, reader);

		Ok(())
	}

	/// Add a tile source to the server from a file path
	///
	/// The tiles will be served at /tiles/{name}/...
	/// Sources can be added before or after starting the server.
	/// Changes take effect immediately without requiring a restart (hot reload).
	#[napi]
	pub async fn add_tile_source_from_path(&self, name: String, path: String) -> Result<()> {
		// Open the tile source
		let tile_source = TileSource::open(path).await?;

		// Delegate to add_tile_source
		self.add_tile_source(name, &tile_source).await
	}

	/// Remove a tile source from the server
	///
	/// Changes take effect immediately without requiring a restart (hot reload).
	/// Returns true if the source was found and removed, false otherwise.
	#[napi]
	pub async fn remove_tile_source(&self, name: String) -> Result<bool> {
		// Remove from our map (source of truth)
		let mut sources = self.tile_sources.lock().await;
		let was_removed = sources.remove(&name).is_some();
		drop(sources);

		// If server is running, remove the source directly for hot reload
		if was_removed {
			let mut server_lock = self.inner.lock().await;
			if let Some(server) = server_lock.as_mut() {
				napi_result!(server.remove_tile_source(&name))?;
			}
		}

		Ok(was_removed)
	}

	/// Add a static file source to the server
	///
	/// Serves static files from a path (can be a .tar or directory)
	/// Changes take effect immediately without requiring a restart (hot reload).
	#[napi]
	pub async fn add_static_source(&self, path: String, url_prefix: Option<String>) -> Result<()> {
		let prefix = url_prefix.clone().unwrap_or_else(|| "/".to_string());

		// Validate that the path exists
		let data_location = DataLocation::from(path.clone());
		let path_buf = napi_result!(data_location.as_path())?;
		if !path_buf.exists() {
			return Err(Error::from_reason(format!(
				"Static source path does not exist: {}",
				path
			)));
		}

		// Store the source in our list (source of truth)
		let mut sources = self.static_sources.lock().await;
		sources.push((path.clone(), url_prefix.clone()));
		drop(sources);

		// If server is running, add the source directly for hot reload
		let mut server_lock = self.inner.lock().await;
		if let Some(server) = server_lock.as_mut() {
			napi_result!(server.add_static_source(path_buf, &prefix).await)?;
		}

		Ok(())
	}

	/// Remove a static file source from the server by URL prefix
	///
	/// Changes take effect immediately without requiring a restart (hot reload).
	/// Returns true if the source was found and removed, false otherwise.
	#[napi]
	pub async fn remove_static_source(&self, url_prefix: String) -> Result<bool> {
		// Remove from our list (source of truth)
		let mut sources = self.static_sources.lock().await;
		let initial_len = sources.len();
		sources.retain(|(_, p)| p.as_ref() != Some(&url_prefix));
		let was_removed = sources.len() < initial_len;
		drop(sources);

		// If server is running, remove the source directly for hot reload
		let mut server_lock = self.inner.lock().await;
		if let Some(server) = server_lock.as_mut() {
			napi_result!(server.remove_static_source(&url_prefix))?;
		}

		Ok(was_removed)
	}

	/// Start the HTTP server
	///
	/// Starts the HTTP server and begins listening for requests on the configured
	/// IP address and port. All tile and static sources that have been added will
	/// be immediately available.
	///
	/// # Returns
	///
	/// Returns `Ok(())` if the server started successfully
	///
	/// # Errors
	///
	/// Returns an error if:
	/// - The server is already running
	/// - The port is already in use
	/// - Unable to bind to the specified IP address
	/// - Configuration is invalid
	///
	/// # Examples
	///
	/// ```javascript
	/// const server = new TileServer({ port: 8080 });
	/// await server.addTileSource('osm', 'tiles.versatiles');
	/// await server.start();
	/// console.log('Server started successfully');
	/// ```
	#[napi]
	pub async fn start(&self) -> Result<()> {
		let mut server_lock = self.inner.lock().await;

		if server_lock.is_some() {
			return Err(Error::from_reason("Server is already running"));
		}

		// Build config with all accumulated sources
		let mut config = Config::default();

		config.server.port = Some(self.initial_port);
		config.server.ip = Some(self.ip.clone());
		config.server.minimal_recompression = self.minimal_recompression;

		// Add all static sources to config
		let static_sources = self.static_sources.lock().await;
		for (path, url_prefix) in static_sources.iter() {
			use versatiles::config::StaticSourceConfig;
			let data_location = DataLocation::from(path.clone());
			config.static_sources.push(StaticSourceConfig {
				src: data_location,
				prefix: url_prefix.clone(),
			});
		}

		let mut server = napi_result!(RustTileServer::from_config(config, self.runtime.clone()).await)?;

		napi_result!(server.start().await)?;

		let tile_sources = self.tile_sources.lock().await;
		for (name, tile_source) in tile_sources.iter() {
			// Add to server
			napi_result!(server.add_tile_source(name.clone(), tile_source.clone()).await)?;
		}

		// Cache the actual bound port for synchronous access
		let bound_port = server.get_port();
		*self
			.actual_port
			.write()
			.expect("Port cache RwLock poisoned - server state corrupted") = Some(bound_port);

		*server_lock = Some(server);

		Ok(())
	}

	/// Stop the HTTP server gracefully
	///
	/// Gracefully shuts down the HTTP server, completing any in-flight requests
	/// before closing. After stopping, the server can be restarted by calling
	/// `start()` again.
	///
	/// If the server is not running, this method does nothing and returns successfully.
	///
	/// # Examples
	///
	/// ```javascript
	/// await server.start();
	/// // ... server is running ...
	/// await server.stop();
	/// console.log('Server stopped');
	///
	/// // Can restart later
	/// await server.start();
	/// ```
	#[napi]
	pub async fn stop(&self) -> Result<()> {
		let mut server_lock = self.inner.lock().await;

		if let Some(mut server) = server_lock.take() {
			server.stop().await;
		}

		// Clear cached port when server stops
		*self
			.actual_port
			.write()
			.expect("Port cache RwLock poisoned - server state corrupted") = None;

		Ok(())
	}

	/// Get the server port
	///
	/// Returns the actual bound port if the server is running, or the configured
	/// port if the server hasn't been started yet.
	///
	/// For ephemeral ports (configured as 0), this will return the OS-assigned
	/// port after `start()` is called.
	///
	/// # Returns
	///
	/// The port number as a 32-bit unsigned integer.
	///
	/// # Examples
	///
	/// ```javascript
	/// const server = new TileServer({ port: 0 }); // Ephemeral port
	/// console.log(server.port); // 0 (before starting)
	/// await server.start();
	/// console.log(server.port); // 54321 (actual assigned port, no await needed!)
	/// ```
	#[napi(getter)]
	pub fn port(&self) -> u32 {
		// Try to read cached actual port first (when server is running)
		match self.actual_port.read() {
			Ok(guard) => {
				if let Some(actual) = *guard {
					actual as u32
				} else {
					// Fallback to configured port (before server starts)
					self.initial_port as u32
				}
			}
			Err(_) => {
				// Fallback to configured port if lock is poisoned
				self.initial_port as u32
			}
		}
	}
}
