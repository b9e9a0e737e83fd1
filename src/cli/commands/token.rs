use clap::{Arg, Command};

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("signing-key")
                .long("signing-key")
                .help("Path to the RSA private key (PEM) used to sign tokens")
                .env("LABGATE_SIGNING_KEY")
                .required(true),
        )
        .arg(
            Arg::new("kid")
                .long("kid")
                .help("Key id published in token headers")
                .env("LABGATE_KID")
                .default_value("labgate"),
        )
        .arg(
            Arg::new("issuer")
                .long("issuer")
                .help("Issuer claim stamped into every token")
                .env("LABGATE_ISSUER")
                .default_value("https://auth.labgate.dev"),
        )
        .arg(
            Arg::new("audience")
                .long("audience")
                .help("Audience claim stamped into every token")
                .env("LABGATE_AUDIENCE")
                .default_value("labgate"),
        )
        .arg(
            Arg::new("access-ttl-seconds")
                .long("access-ttl-seconds")
                .help("Access token TTL in seconds")
                .env("LABGATE_ACCESS_TTL_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("refresh-ttl-seconds")
                .long("refresh-ttl-seconds")
                .help("Refresh token TTL in seconds")
                .env("LABGATE_REFRESH_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64)),
        )
}
