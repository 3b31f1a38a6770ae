//! mv-cam-driver binary: stream from a V4L2 camera and log every frame.
//!
//! Usage: `mv-cam-driver [settings.json] [config.json]`. Without a config file
//! the device keeps its current configuration. Streams until ten grabs in a
//! row fail.

use std::error::Error;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mv_cam_driver::{Camera, CameraConfig, DriverSettings, V4l2System, LEVEL_RECONFIGURE_STOP};

const MAX_CONSECUTIVE_FAILURES: u32 = 10;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run() {
        tracing::error!(error = %err, "camera driver failed");
        let mut source = err.source();
        while let Some(cause) = source {
            tracing::error!(cause = %cause, "caused by");
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);

    let settings = match args.next() {
        Some(path) => DriverSettings::from_file(&path)?,
        None => DriverSettings::default(),
    };
    let config = match args.next() {
        Some(path) => Some(CameraConfig::from_json(&std::fs::read_to_string(&path)?)?),
        None => None,
    };

    let camera = Camera::new(V4l2System::new(), &settings);
    camera.connect()?;
    info!(serial = camera.serial(), model = ?camera.model(), "camera ready");

    if let Some(config) = &config {
        camera.apply_configuration(config, LEVEL_RECONFIGURE_STOP)?;
    }
    camera.start()?;

    let mut failures = 0;
    let err = loop {
        match camera.grab_frame() {
            Ok(image) => {
                failures = 0;
                info!(
                    sequence = image.sequence,
                    encoding = %image.encoding,
                    width = image.width,
                    height = image.height,
                    bytes = image.data.len(),
                    timestamp = ?Duration::from(image.timestamp),
                    "frame"
                );
            }
            Err(err) => {
                failures += 1;
                warn!(error = %err, failures, "grab failed");
                if failures >= MAX_CONSECUTIVE_FAILURES {
                    break err;
                }
            }
        }
    };

    if let Err(disconnect) = camera.disconnect() {
        warn!(error = %disconnect, "failed to release camera");
    }
    Err(err.into())
}
