//! Human readable rendering of a parsed manifest.

use std::fmt::Write;
use std::sync::Arc;

use manifest_engine::{Manifest, PresentationTimeline, Stream, Variant};

use crate::utils::format_duration;

fn describe_timeline(timeline: &PresentationTimeline) -> String {
    let kind = if timeline.is_live { "LIVE" } else { "VOD" };
    format!(
        "{kind} duration={} seek=[{:.2}, {:.2}] delay={:.2}s max-segment={:.2}s",
        format_duration(timeline.duration()),
        timeline.seek_range_start,
        timeline.seek_range_end,
        timeline.presentation_delay,
        timeline.max_segment_duration,
    )
}

fn describe_stream(stream: &Stream) -> String {
    let mut line = format!(
        "#{} {} {} codecs=\"{}\"",
        stream.id, stream.content_type, stream.mime_type, stream.codecs
    );
    let attributes = &stream.attributes;
    if let Some(resolution) = &attributes.resolution {
        let _ = write!(line, " {resolution}");
    }
    if let Some(frame_rate) = attributes.frame_rate {
        let _ = write!(line, " {frame_rate}fps");
    }
    if let Some(channels) = attributes.channels_count {
        let _ = write!(line, " channels={channels}");
    }
    if stream.language() != "und" {
        let _ = write!(line, " lang={}", stream.language());
    }
    if let Some(label) = &attributes.label {
        let _ = write!(line, " name=\"{label}\"");
    }
    if stream.presentation_time_offset != 0.0 {
        let _ = write!(line, " offset={:.3}s", stream.presentation_time_offset);
    }
    if stream.encrypted {
        line.push_str(" encrypted");
    }
    line
}

fn describe_variant(variant: &Variant) -> String {
    let mut line = format!(
        "variant {} bandwidth={} lang={}",
        variant.id, variant.bandwidth, variant.language
    );
    if variant.primary {
        line.push_str(" primary");
    }
    if variant.encrypted {
        let systems: Vec<&str> = variant
            .drm_infos
            .iter()
            .map(|info| info.key_system.as_str())
            .collect();
        let _ = write!(line, " drm={}", systems.join(","));
    }
    line
}

/// Render the manifest as indented text, one line per variant and stream
pub fn render_text(manifest: &Manifest) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", describe_timeline(&manifest.presentation_timeline));

    for period in &manifest.periods {
        for variant in &period.variants {
            let _ = writeln!(out, "{}", describe_variant(variant));
            for stream in variant.streams() {
                let _ = writeln!(out, "  {}", describe_stream(stream));
            }
        }
        for stream in &period.text_streams {
            let _ = writeln!(out, "text {}", describe_stream(stream));
        }
    }
    out
}

/// Render the whole presentation graph as pretty JSON
pub fn render_json(manifest: &Manifest) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(manifest)
}

/// Distinct streams referenced by the manifest
pub fn stream_count(manifest: &Manifest) -> usize {
    let mut seen: Vec<&Arc<Stream>> = Vec::new();
    for period in &manifest.periods {
        let streams = period
            .variants
            .iter()
            .flat_map(Variant::streams)
            .chain(period.text_streams.iter());
        for stream in streams {
            if !seen.iter().any(|s| Arc::ptr_eq(s, stream)) {
                seen.push(stream);
            }
        }
    }
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_timeline() {
        let vod = PresentationTimeline {
            duration: Some(90.0),
            is_live: false,
            seek_range_start: 0.0,
            seek_range_end: 90.0,
            presentation_delay: 0.0,
            max_segment_duration: 6.0,
        };
        assert_eq!(
            describe_timeline(&vod),
            "VOD duration=1.50m seek=[0.00, 90.00] delay=0.00s max-segment=6.00s"
        );

        let live = PresentationTimeline {
            duration: None,
            is_live: true,
            ..vod
        };
        assert!(describe_timeline(&live).starts_with("LIVE duration=unbounded"));
    }

    #[test]
    fn test_empty_manifest_renders_timeline_only() {
        let manifest = Manifest {
            presentation_timeline: PresentationTimeline {
                duration: Some(10.0),
                is_live: false,
                seek_range_start: 0.0,
                seek_range_end: 10.0,
                presentation_delay: 0.0,
                max_segment_duration: 5.0,
            },
            periods: Vec::new(),
        };
        assert_eq!(render_text(&manifest).lines().count(), 1);
        assert_eq!(stream_count(&manifest), 0);
        assert!(render_json(&manifest).unwrap().contains("\"is_live\": false"));
    }
}
