//! Live audio capture for the oscilloscope.
//!
//! A dedicated thread owns the cpal input stream and publishes every buffer
//! it receives as an atomic snapshot. Samples use the byte convention the
//! oscilloscope expects: unsigned 0-255 amplitude with 128 as silence.

use anyhow::{ensure, Context as _, Result};
use arc_swap::ArcSwap;
use cpal::{
    traits::{DeviceTrait as _, HostTrait as _, StreamTrait as _},
    SampleFormat, Stream,
};
use log::{info, warn};
use std::{
    sync::{mpsc, Arc},
    thread,
};

/// A handle to the latest captured sample buffer.
///
/// The capture thread is the only writer; readers take whole-buffer
/// snapshots, so a frame never observes a half-written buffer.
#[derive(Debug)]
pub struct ScopeFeed {
    samples: Arc<ArcSwap<Vec<u8>>>,
}

impl ScopeFeed {
    pub fn snapshot(&self) -> Arc<Vec<u8>> {
        self.samples.load_full()
    }
}

/// Starts capturing from the default input device.
///
/// `None` when no device is available or the stream cannot be built; the
/// oscilloscope then stays in its idle state.
pub fn start_capture() -> Option<ScopeFeed> {
    let samples = Arc::new(ArcSwap::from_pointee(Vec::new()));
    let writer = samples.clone();
    let (sender, receiver) = mpsc::channel();

    thread::spawn(move || {
        let stream = match build_stream(&writer) {
            Ok(stream) => stream,
            Err(e) => {
                warn!("audio capture unavailable: {e}");
                drop(sender);
                return;
            }
        };

        if let Err(e) = stream.play() {
            warn!("failed to start audio capture: {e}");
            drop(sender);
            return;
        }

        if sender.send(()).is_err() {
            return;
        }

        // the stream lives as long as this thread does
        loop {
            thread::park();
        }
    });

    receiver.recv().ok().map(|()| ScopeFeed { samples })
}

fn build_stream(writer: &Arc<ArcSwap<Vec<u8>>>) -> Result<Stream> {
    let device = cpal::default_host()
        .default_input_device()
        .context("no default input device")?;
    let config = device.default_input_config()?;

    ensure!(
        config.sample_format() == SampleFormat::F32,
        "unsupported sample format {}",
        config.sample_format()
    );

    info!(
        "capturing from {:?} at {} Hz",
        device.name(),
        config.sample_rate().0
    );

    let channels = usize::from(config.channels());
    let writer = writer.clone();

    let stream = device.build_input_stream(
        &config.into(),
        move |data: &[f32], _| {
            // first channel only, f32 [-1, 1] mapped to bytes with 128 at
            // silence
            let buffer = data
                .iter()
                .step_by(channels)
                .map(|&sample| sample.clamp(-1.0, 1.0).mul_add(128.0, 128.0).min(255.0) as u8)
                .collect();

            writer.store(Arc::new(buffer));
        },
        |e| warn!("input stream error: {e}"),
        None,
    )?;

    Ok(stream)
}
