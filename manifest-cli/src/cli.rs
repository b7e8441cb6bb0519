use clap::Parser;

/// Define CLI arguments
#[derive(Parser, Debug)]
#[command(
    author = "hua0512 <https://github.com/hua0512>",
    version,
    about = "HLS manifest inspection tool",
    long_about = "Parses an HLS master playlist and every media playlist it references,\n\
                  then prints the resulting presentation: timeline, variants with their\n\
                  audio and video streams, and text streams.\n\
                  \n\
                  Stream start times are read from the first bytes of each stream's\n\
                  first segment (fMP4 or MPEG-TS)."
)]
pub struct CliArgs {
    /// Master playlist URL
    #[arg(required = true, help = "URL of the HLS master playlist")]
    pub url: String,

    /// Print the presentation as JSON
    #[arg(short, long, help = "Print the full presentation graph as JSON")]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable detailed debug logging")]
    pub verbose: bool,

    /// Request timeout with optional unit (s, m, h)
    #[arg(
        long,
        default_value = "30s",
        help = "Timeout for each HTTP request with optional unit (s, m, h). Use 0 to disable."
    )]
    pub timeout: String,

    /// Connection timeout in seconds
    #[arg(
        long,
        default_value = "10",
        help = "Connection timeout in seconds (time to establish initial connection)"
    )]
    pub connect_timeout: u64,

    /// Attempts per request
    #[arg(
        long,
        default_value = "2",
        help = "Number of attempts for each request, including the first one"
    )]
    pub attempts: u32,

    /// Override the default user agent
    #[arg(long, help = "User agent sent with every request")]
    pub user_agent: Option<String>,

    /// Custom HTTP headers
    #[arg(
        long = "header",
        short = 'H',
        help = "Add custom HTTP header to requests (can be used multiple times). Format: 'Name: Value'",
        value_name = "HEADER"
    )]
    pub headers: Vec<String>,

    /// Ignore key tags
    #[arg(long, help = "Ignore EXT-X-KEY tags; streams are reported unencrypted")]
    pub ignore_drm: bool,

    /// Live seek window with optional unit (s, m, h)
    #[arg(
        long,
        help = "Cap the live seek range to this window with optional unit (s, m, h)"
    )]
    pub availability_window: Option<String>,

    /// Live presentation delay with optional unit (s, m, h)
    #[arg(
        long,
        help = "Delay behind the live edge with optional unit (s, m, h). Defaults to 3 target durations."
    )]
    pub presentation_delay: Option<String>,

    /// Bytes fetched from the first segment of each stream
    #[arg(
        long,
        default_value = "2048",
        help = "Bytes of the first segment fetched to read its start time"
    )]
    pub sniff_bytes: u64,
}
