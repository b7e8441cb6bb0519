use serde::Serialize;

/// Timing information of the whole presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentationTimeline {
    /// Total duration in seconds, `None` when unbounded (live)
    pub duration: Option<f64>,
    pub is_live: bool,
    pub seek_range_start: f64,
    pub seek_range_end: f64,
    /// How far behind the live edge playback starts, 0 for VOD
    pub presentation_delay: f64,
    pub max_segment_duration: f64,
}

impl PresentationTimeline {
    pub fn duration(&self) -> f64 {
        self.duration.unwrap_or(f64::INFINITY)
    }

    pub fn is_live(&self) -> bool {
        self.is_live
    }

    pub fn seek_range_start(&self) -> f64 {
        self.seek_range_start
    }

    pub fn seek_range_end(&self) -> f64 {
        self.seek_range_end
    }
}

/// Per-stream inputs to the timeline computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct StreamTiming {
    pub presentation_time_offset: f64,
    pub duration: f64,
    pub target_duration: Option<f64>,
    pub max_segment_duration: f64,
    pub live: bool,
}

/// Options that shape the live timeline
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct TimelineOptions {
    pub availability_window_override: Option<f64>,
    pub default_presentation_delay: Option<f64>,
}

impl PresentationTimeline {
    /// Build the timeline from the audio and video streams of a presentation.
    ///
    /// The duration is the shortest stream. The seek range starts at the
    /// largest presentation time offset; for live it is narrowed to the
    /// availability window before the live edge.
    pub(crate) fn from_streams(streams: &[StreamTiming], options: TimelineOptions) -> Self {
        let is_live = streams.iter().any(|timing| timing.live);
        let shortest = streams
            .iter()
            .map(|timing| timing.duration)
            .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.min(d))))
            .unwrap_or_default();
        let max_offset = streams
            .iter()
            .map(|timing| timing.presentation_time_offset)
            .fold(0.0, f64::max);
        let max_segment_duration = streams
            .iter()
            .map(|timing| timing.max_segment_duration)
            .fold(0.0, f64::max);

        if !is_live {
            return Self {
                duration: Some(shortest),
                is_live,
                seek_range_start: max_offset,
                seek_range_end: max_offset + shortest,
                presentation_delay: 0.0,
                max_segment_duration,
            };
        }

        let live_edge = max_offset + shortest;
        let window = options
            .availability_window_override
            .filter(|window| window.is_finite() && *window >= 0.0)
            .map_or(shortest, |window| window.min(shortest));
        let max_target_duration = streams
            .iter()
            .filter_map(|timing| timing.target_duration)
            .fold(0.0, f64::max);
        let presentation_delay = options
            .default_presentation_delay
            .unwrap_or(3.0 * max_target_duration);

        Self {
            duration: None,
            is_live,
            seek_range_start: max_offset.max(live_edge - window),
            seek_range_end: live_edge,
            presentation_delay,
            max_segment_duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(offset: f64, duration: f64, live: bool) -> StreamTiming {
        StreamTiming {
            presentation_time_offset: offset,
            duration,
            target_duration: Some(5.0),
            max_segment_duration: 5.0,
            live,
        }
    }

    #[test]
    fn test_vod_timeline() {
        let timeline = PresentationTimeline::from_streams(
            &[timing(0.0, 15.0, false), timing(655.36, 10.0, false)],
            TimelineOptions::default(),
        );
        assert!(!timeline.is_live());
        assert_eq!(timeline.duration(), 10.0);
        assert_eq!(timeline.seek_range_start(), 655.36);
        assert_eq!(timeline.presentation_delay, 0.0);
    }

    #[test]
    fn test_live_timeline() {
        let timeline = PresentationTimeline::from_streams(
            &[timing(100.0, 30.0, true), timing(100.0, 30.0, false)],
            TimelineOptions::default(),
        );
        assert!(timeline.is_live());
        assert_eq!(timeline.duration, None);
        assert_eq!(timeline.duration(), f64::INFINITY);
        assert_eq!(timeline.seek_range_start(), 100.0);
        assert_eq!(timeline.seek_range_end(), 130.0);
        assert_eq!(timeline.presentation_delay, 15.0);
    }

    #[test]
    fn test_live_availability_window_override() {
        let timeline = PresentationTimeline::from_streams(
            &[timing(100.0, 30.0, true)],
            TimelineOptions {
                availability_window_override: Some(12.0),
                default_presentation_delay: Some(10.0),
            },
        );
        assert_eq!(timeline.seek_range_start(), 118.0);
        assert_eq!(timeline.presentation_delay, 10.0);
    }
}
