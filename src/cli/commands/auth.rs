use clap::{builder::PossibleValuesParser, Arg, Command};

pub fn with_args(command: Command) -> Command {
    let command = with_otp_args(command);
    let command = with_rate_limit_args(command);
    with_cookie_args(command)
}

fn with_otp_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("frontend-base-url")
                .long("frontend-base-url")
                .help("Frontend base URL, used as the CORS origin and for cookie security")
                .env("LABGATE_FRONTEND_BASE_URL")
                .default_value("http://localhost:5173"),
        )
        .arg(
            Arg::new("otp-ttl-seconds")
                .long("otp-ttl-seconds")
                .help("One-time code TTL in seconds")
                .env("LABGATE_OTP_TTL_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("otp-max-attempts")
                .long("otp-max-attempts")
                .help("Wrong guesses before a one-time code is invalidated")
                .env("LABGATE_OTP_MAX_ATTEMPTS")
                .default_value("5")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("otp-issue-limit")
                .long("otp-issue-limit")
                .help("Codes issued per account within the issue window")
                .env("LABGATE_OTP_ISSUE_LIMIT")
                .default_value("3")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("otp-issue-window-seconds")
                .long("otp-issue-window-seconds")
                .help("Window for the per-account code issue limit")
                .env("LABGATE_OTP_ISSUE_WINDOW_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_rate_limit_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("ip-rate-limit-capacity")
                .long("ip-rate-limit-capacity")
                .help("Login attempts allowed per client address per window")
                .env("LABGATE_IP_RATE_LIMIT_CAPACITY")
                .default_value("5")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("ip-rate-limit-window-seconds")
                .long("ip-rate-limit-window-seconds")
                .help("Refill window for the per-address bucket")
                .env("LABGATE_IP_RATE_LIMIT_WINDOW_SECONDS")
                .default_value("60")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("user-rate-limit-capacity")
                .long("user-rate-limit-capacity")
                .help("Login attempts allowed per account per window")
                .env("LABGATE_USER_RATE_LIMIT_CAPACITY")
                .default_value("5")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("user-rate-limit-window-seconds")
                .long("user-rate-limit-window-seconds")
                .help("Refill window for the per-account bucket")
                .env("LABGATE_USER_RATE_LIMIT_WINDOW_SECONDS")
                .default_value("60")
                .value_parser(clap::value_parser!(u64)),
        )
}

fn with_cookie_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("cookie-domain")
                .long("cookie-domain")
                .help("Domain attribute for session cookies (host-only when unset)")
                .env("LABGATE_COOKIE_DOMAIN"),
        )
        .arg(
            Arg::new("cookie-same-site")
                .long("cookie-same-site")
                .help("SameSite attribute for session cookies")
                .env("LABGATE_COOKIE_SAME_SITE")
                .default_value("Lax")
                .value_parser(PossibleValuesParser::new(["Lax", "Strict", "None"])),
        )
}
