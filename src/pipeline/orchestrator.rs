//! Pipeline orchestration
//!
//! Coordinates clip discovery, audio analysis, timeline construction and
//! export. Clip-pool loading runs on a worker thread concurrently with the
//! audio analysis; both are pure consumers of their own inputs, so there is
//! no shared mutable state between them.

use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use crossbeam_channel::bounded;
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info, warn};

use crate::analysis;
use crate::audio;
use crate::cancel::CancelToken;
use crate::config::Settings;
use crate::discovery::{self, DiscoveredClip};
use crate::error::{BeatcutError, Result};
use crate::export;
use crate::timeline;
use crate::types::{AudioAnalysis, TempoEstimate, VideoClip};
use crate::video;

/// Name of the plan file written into the output directory
pub const PLAN_FILE_NAME: &str = "edit_plan.json";

/// Pipeline result summary
#[derive(Debug)]
pub struct PipelineResult {
    pub bpm: f64,
    pub beat_count: usize,
    pub discovered_clips: usize,
    pub usable_clips: usize,
    pub event_count: usize,
    pub seed: u64,
    pub plan_path: Option<PathBuf>,
}

/// Run the full pipeline: discover clips, analyze the track, build the
/// timeline, write the edit plan.
pub fn run(settings: &Settings, cancel: &CancelToken) -> Result<PipelineResult> {
    let pipeline_start = Instant::now();

    settings.validate()?;
    configure_thread_pool(settings.threads)?;

    // Phase 1: discovery
    info!("Scanning for video clips...");
    let discovered = discovery::scan(&settings.clips, settings.recursive)?;
    let discovered_clips = discovered.len();

    if settings.dry_run {
        return run_dry_run(&discovered, settings);
    }

    let progress = make_progress(settings.show_progress);

    // Phase 2: clip pool on a worker thread, audio analysis here.
    let (pool_tx, pool_rx) = bounded::<Vec<VideoClip>>(1);
    let pool_thread = thread::spawn(move || {
        let pool = video::load_pool(&discovered);
        // receiver may be gone if the analysis failed first
        let _ = pool_tx.send(pool);
    });

    let analysis_start = Instant::now();
    let audio_result = analyze_audio(settings, &progress, cancel);

    let pool = match pool_rx.recv() {
        Ok(pool) => pool,
        Err(_) => {
            warn!("Clip pool worker terminated without a result");
            Vec::new()
        }
    };
    if let Err(panic_info) = pool_thread.join() {
        let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        error!("Clip pool worker panicked: {}", panic_msg);
    }

    let audio_analysis = audio_result?;
    info!(
        "Audio analysis completed in {:.2}s ({:.1} BPM, {} beats)",
        analysis_start.elapsed().as_secs_f64(),
        audio_analysis.bpm,
        audio_analysis.beat_times.len()
    );

    let usable_clips = pool.len();
    if pool.is_empty() {
        warn!("No usable video clips; the edit plan will be empty");
    }

    // Phase 3: timeline
    set_message(&progress, "Building timeline...");
    let seed = settings.seed.unwrap_or_else(rand::random);
    info!("Building timeline with seed {}", seed);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let events = timeline::build(
        &audio_analysis.beat_times,
        audio_analysis.duration_seconds,
        &pool,
        &settings.build,
        &mut rng,
        cancel,
    )?;
    info!("Generated {} timeline events", events.len());

    // Phase 4: export
    set_message(&progress, "Writing edit plan...");
    std::fs::create_dir_all(&settings.output)
        .map_err(|e| BeatcutError::output_error(&settings.output, e.to_string()))?;

    let plan_path = settings.output.join(PLAN_FILE_NAME);
    let plan = export::build_plan(&audio_analysis, &pool, &events, seed);
    export::write_edit_plan(&plan, &plan_path)?;

    if let Some(pb) = &progress {
        pb.finish_with_message(format!(
            "Done: {:.1} BPM, {} beats, {} events",
            audio_analysis.bpm,
            audio_analysis.beat_times.len(),
            events.len()
        ));
    }

    info!(
        "Total pipeline time: {:.2}s",
        pipeline_start.elapsed().as_secs_f64()
    );

    Ok(PipelineResult {
        bpm: audio_analysis.bpm,
        beat_count: audio_analysis.beat_times.len(),
        discovered_clips,
        usable_clips,
        event_count: events.len(),
        seed,
        plan_path: Some(plan_path),
    })
}

/// Decode the track and run the three analysis stages, with progress
/// messages at each stage boundary.
fn analyze_audio(
    settings: &Settings,
    progress: &Option<ProgressBar>,
    cancel: &CancelToken,
) -> Result<AudioAnalysis> {
    let params = &settings.analysis;

    set_message(progress, "Computing onset envelope...");
    let mut stream = audio::open(&settings.audio)?;
    let sample_rate = stream.sample_rate();

    let envelope = analysis::onset::extract(&mut stream, params.window_size, params.hop_size, cancel)?;
    let duration_seconds = stream.seconds_read();
    debug!(
        "Onset envelope: {} frames over {:.2}s",
        envelope.len(),
        duration_seconds
    );

    set_message(progress, "Estimating tempo...");
    let bpm = analysis::tempo::estimate(
        &envelope,
        sample_rate,
        params.hop_size,
        params.min_bpm,
        params.max_bpm,
        cancel,
    )?;
    let tempo = TempoEstimate::from_bpm(bpm);
    debug!("Estimated tempo: {:.1} BPM", tempo.bpm);

    set_message(progress, "Tracking beats...");
    let beat_times = analysis::beats::track(
        &envelope,
        sample_rate,
        params.hop_size,
        duration_seconds,
        tempo.beat_period_seconds,
        params.snap_window_seconds,
        cancel,
    )?;
    debug!("Tracked {} beats", beat_times.len());

    Ok(AudioAnalysis {
        source_path: settings.audio.clone(),
        duration_seconds,
        sample_rate,
        hop_size: params.hop_size,
        bpm: tempo.bpm,
        beat_period_seconds: tempo.beat_period_seconds,
        onset_envelope: envelope,
        beat_times,
    })
}

/// Dry run mode - list discovered clips and their sidecar status
fn run_dry_run(clips: &[DiscoveredClip], settings: &Settings) -> Result<PipelineResult> {
    println!();
    println!("=== DRY RUN MODE ===");
    println!();

    for clip in clips {
        let has_manifest = video::manifest::sidecar_path(&clip.path).exists();
        let has_bookmarks = video::bookmarks::bookmark_path(&clip.path).exists();
        println!(
            "  {}  [metadata: {}, bookmarks: {}]",
            clip.path.display(),
            if has_manifest { "yes" } else { "MISSING" },
            if has_bookmarks { "yes" } else { "no" },
        );
    }

    println!();
    println!(
        "Would analyze {} against {} clips and write {}",
        settings.audio.display(),
        clips.len(),
        settings.output.join(PLAN_FILE_NAME).display()
    );
    println!();

    Ok(PipelineResult {
        bpm: 0.0,
        beat_count: 0,
        discovered_clips: clips.len(),
        usable_clips: 0,
        event_count: 0,
        seed: settings.seed.unwrap_or(0),
        plan_path: None,
    })
}

/// Configure the Rayon thread pool
fn configure_thread_pool(num_threads: usize) -> Result<()> {
    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        Ok(()) => {
            debug!("Configured thread pool with {} threads", num_threads);
        }
        Err(e) => {
            // If the pool is already initialized (e.g., in tests), that's OK
            if e.to_string().contains("already been initialized") {
                debug!("Thread pool already initialized, using existing pool");
            } else {
                return Err(BeatcutError::Config(format!(
                    "Failed to configure thread pool: {}",
                    e
                )));
            }
        }
    }
    Ok(())
}

fn make_progress(show: bool) -> Option<ProgressBar> {
    if !show {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    Some(pb)
}

fn set_message(progress: &Option<ProgressBar>, message: &'static str) {
    if let Some(pb) = progress {
        pb.set_message(message);
    }
}
