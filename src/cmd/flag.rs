use clap::{Command, Arg};

#[allow(clippy::let_and_return)]
pub fn add_all(app: Command) -> Command {
    let app = add_flags(app);
    let app = add_options(app);
    let app = add_global_options(app);
    app
}

pub fn add_flags(app: Command) -> Command {
    app.next_help_heading("FLAGS").args(&[
        Arg::new("help")
            .short('h')
            .long("help")
            .help("show help")
            .display_order(0),
        Arg::new("version")
            .short('v')
            .long("version")
            .help("show version")
            .display_order(1),
    ])
}

pub fn add_options(app: Command) -> Command {
    app.next_help_heading("OPTIONS").args(&[
        Arg::new("config")
            .short('c')
            .long("config")
            .help("use config file")
            .value_name("path")
            .takes_value(true)
            .display_order(0),
        Arg::new("listen")
            .short('l')
            .long("listen")
            .help("listen address")
            .value_name("address")
            .takes_value(true)
            .display_order(1),
        Arg::new("seed")
            .short('s')
            .long("seed")
            .help("seed directive, skip reading one")
            .value_name("directive")
            .takes_value(true)
            .display_order(2),
        Arg::new("nofile")
            .short('n')
            .long("nofile")
            .help("set nofile limit")
            .value_name("limit")
            .takes_value(true)
            .display_order(3),
        Arg::new("through")
            .short('x')
            .long("through")
            .help("send through ip or address")
            .value_name("address")
            .takes_value(true)
            .display_order(4),
        Arg::new("interface")
            .short('i')
            .long("interface")
            .help("bind to interface")
            .value_name("device")
            .takes_value(true)
            .display_order(5),
        Arg::new("buf_size")
            .short('b')
            .long("buf-size")
            .help("relay buffer per direction")
            .value_name("bytes")
            .takes_value(true)
            .display_order(6),
    ])
}

pub fn add_global_options(app: Command) -> Command {
    // log
    let app = app.next_help_heading("LOG OPTIONS").args(&[
        Arg::new("log_level")
            .long("log-level")
            .help("override log level")
            .value_name("level")
            .takes_value(true)
            .display_order(0),
        Arg::new("log_output")
            .long("log-output")
            .help("override log output")
            .value_name("path")
            .takes_value(true)
            .display_order(1),
    ]);

    // dns
    let app = app.next_help_heading("DNS OPTIONS").args(&[
        Arg::new("dns_mode")
            .long("dns-mode")
            .help("override dns mode")
            .value_name("mode")
            .takes_value(true)
            .display_order(0),
        Arg::new("dns_protocol")
            .long("dns-protocol")
            .help("override dns protocol")
            .value_name("protocol")
            .takes_value(true)
            .display_order(1),
        Arg::new("dns_servers")
            .long("dns-servers")
            .help("override dns servers")
            .value_name("servers")
            .takes_value(true)
            .display_order(2),
        Arg::new("dns_cache_size")
            .long("dns-cache-size")
            .help("override dns cache size")
            .value_name("number")
            .takes_value(true)
            .display_order(3),
    ]);

    // directive and connect limits belong to endpoints
    let app = app.next_help_heading("TIMEOUT OPTIONS").args([
        Arg::new("connect_timeout")
            .long("connect-timeout")
            .help("override connect timeout")
            .value_name("second")
            .takes_value(true)
            .display_order(0),
        Arg::new("directive_timeout")
            .long("directive-timeout")
            .help("override directive timeout")
            .value_name("second")
            .takes_value(true)
            .display_order(1),
        Arg::new("max_directive_len")
            .long("max-directive-len")
            .help("override directive length limit")
            .value_name("bytes")
            .takes_value(true)
            .display_order(2),
    ]);

    app
}
