use std::{
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use prefire_audio::{
    sample_file_name, AudioOutput, SampleBank, ScheduledSound, VirtualAudioOutput,
};
use prefire_core::{AudioReadiness, SoundEffect, ToneEvent, Voice};

fn scratch_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let pid = std::process::id();
    let name = format!("prefire-audio-{label}-{pid}-{nanos}");
    let dir = std::env::temp_dir().join(name);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn write_sine(dir: &Path, base_hz: f64) {
    let spec = WavSpec {
        channels: 2,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let path = dir.join(sample_file_name(base_hz));
    let mut writer = WavWriter::create(path, spec).expect("create wav");
    for n in 0..800 {
        let value = (n as f64 * base_hz * std::f64::consts::TAU / 8000.0).sin();
        let sample = (value * f64::from(i16::MAX) * 0.5) as i16;
        writer.write_sample(sample).expect("left");
        writer.write_sample(sample).expect("right");
    }
    writer.finalize().expect("finalize");
}

fn piano(frequency: f64, start_time: f64) -> ToneEvent {
    ToneEvent {
        frequency,
        start_time,
        duration: 0.95,
        voice: Voice::Piano,
    }
}

#[test]
fn partial_sample_directory_loads_what_exists() {
    let dir = scratch_dir("partial");
    write_sine(&dir, 261.63);
    write_sine(&dir, 440.0);
    let junk = dir.join(sample_file_name(392.0));
    std::fs::write(junk, b"not a wav").expect("write junk");

    let bank = SampleBank::load_dir(&dir);
    assert_eq!(bank.len(), 2, "missing and corrupt samples are skipped");
    let tuned = bank.closest(466.16).expect("sample chosen");
    assert_eq!(tuned.sample.base_hz, 440.0);
    assert_eq!(tuned.sample.sample_rate, 8000);
    assert_eq!(
        tuned.sample.frames.len(),
        800,
        "stereo is downmixed to mono"
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unlock_reports_readiness_from_loaded_samples() {
    let dir = scratch_dir("unlock");
    write_sine(&dir, 329.63);

    let mut output = VirtualAudioOutput::new(Some(dir.clone()));
    assert_eq!(output.readiness(), AudioReadiness::Pending);
    output.unlock();
    assert_eq!(output.readiness(), AudioReadiness::Ready);

    let mut empty = VirtualAudioOutput::new(Some(dir.join("missing")));
    empty.unlock();
    assert_eq!(empty.readiness(), AudioReadiness::Unavailable);

    let mut silent = VirtualAudioOutput::new(None);
    silent.unlock();
    assert_eq!(silent.readiness(), AudioReadiness::Unavailable);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unready_output_skips_piano_but_plays_cloud_and_effects() {
    let mut output = VirtualAudioOutput::new(None);
    output.schedule_tone(piano(392.0, 0.1));
    output.schedule_tone(ToneEvent {
        frequency: 440.0,
        start_time: 0.1,
        duration: 0.1,
        voice: Voice::Cloud,
    });
    output.play_effect(SoundEffect::Laser);

    assert_eq!(output.history().len(), 2);
    assert!(matches!(
        output.history()[0],
        ScheduledSound::Tone(ToneEvent {
            voice: Voice::Cloud,
            ..
        })
    ));
}

#[test]
fn suspended_clock_holds_device_time() {
    let mut output = VirtualAudioOutput::with_bank(SampleBank::default());
    output.advance(Duration::from_millis(400));
    output.suspend();
    output.advance(Duration::from_secs(5));
    output.play_effect(SoundEffect::Pew);
    assert!((output.current_time() - 0.4).abs() < 1e-9);
    assert!(
        output.history().is_empty(),
        "suspended output plays nothing"
    );

    output.resume();
    output.advance(Duration::from_millis(100));
    assert!((output.current_time() - 0.5).abs() < 1e-9);
}

#[test]
fn capture_writes_mixed_frames_for_elapsed_time() {
    let dir = scratch_dir("capture");
    write_sine(&dir, 392.0);
    let path = dir.join("session.wav");

    {
        let mut output = VirtualAudioOutput::new(Some(dir.clone()))
            .capture_to(&path)
            .expect("capture opens");
        output.unlock();
        output.schedule_tone(piano(392.0, 0.02));
        for _ in 0..50 {
            output.advance(Duration::from_millis(20));
        }
        output.finish().expect("capture finalizes");
    }

    let reader = WavReader::open(&path).expect("capture readable");
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 44_100);
    let samples: Vec<i16> = reader
        .into_samples::<i16>()
        .collect::<Result<_, _>>()
        .expect("decode capture");
    assert_eq!(samples.len(), 44_100);
    assert!(samples.iter().any(|&sample| sample != 0), "tone audible");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn capture_drops_tones_it_cannot_render() {
    let dir = scratch_dir("unrenderable");
    write_sine(&dir, 392.0);
    let path = dir.join("session.wav");

    {
        let mut output = VirtualAudioOutput::new(Some(dir.clone()))
            .capture_to(&path)
            .expect("capture opens");
        output.unlock();
        assert_eq!(output.readiness(), AudioReadiness::Ready);

        output.schedule_tone(piano(0.0, 0.02));
        assert!(
            output.history().is_empty(),
            "unrenderable tone is not recorded"
        );

        output.schedule_tone(piano(392.0, 0.02));
        assert_eq!(
            output.history(),
            &[ScheduledSound::Tone(piano(392.0, 0.02))]
        );
        output.finish().expect("capture finalizes");
    }

    let _ = std::fs::remove_dir_all(&dir);
}
