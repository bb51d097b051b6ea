use clap::{Command, ArgMatches};

use crate::conf::{Config, CmdOverride, EndpointConf};
use crate::conf::{LogConf, DnsConf, NetConf};

mod flag;

pub enum CmdInput {
    Config(String, CmdOverride),
    Endpoint(EndpointConf, CmdOverride),
    None,
}

fn build_command() -> Command<'static> {
    let app = Command::new("Pivot")
        .about("A chainable tcp pivot relay")
        .version(crate::VERSION)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg_required_else_help(true)
        .override_usage("pivot [FLAGS] [OPTIONS]");

    flag::add_all(app)
}

pub fn scan() -> CmdInput {
    let mut app = build_command();
    let matches = app.clone().get_matches();

    if matches.contains_id("help") {
        let _ = app.print_help();
        return CmdInput::None;
    }

    if matches.contains_id("version") {
        print!("{}", app.render_version());
        if cfg!(feature = "multi-thread") {
            println!("[multi-thread]");
        }
        return CmdInput::None;
    }

    parse_matches(&matches)
}

fn parse_matches(matches: &ArgMatches) -> CmdInput {
    let opts = parse_global_opts(matches);

    if let Some(config) = matches.get_one::<String>("config") {
        return CmdInput::Config(config.to_string(), opts);
    }

    if matches.contains_id("listen") {
        let ep = EndpointConf::from_cmd_args(matches);
        return CmdInput::Endpoint(ep, opts);
    }

    CmdInput::None
}

fn parse_global_opts(matches: &ArgMatches) -> CmdOverride {
    let log = LogConf::from_cmd_args(matches);
    let dns = DnsConf::from_cmd_args(matches);
    let network = NetConf::from_cmd_args(matches);
    let mut endpoint = EndpointConf::from_cmd_args(matches);
    // endpoints from a file keep their own listen address and seed
    endpoint.listen.clear();
    endpoint.seed = None;

    CmdOverride {
        log,
        dns,
        network,
        endpoint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_from(args: &[&str]) -> CmdInput {
        let matches = build_command().get_matches_from(args);
        parse_matches(&matches)
    }

    #[test]
    fn listen_builds_an_endpoint() {
        let input = scan_from(&["pivot", "-l", "127.0.0.1:7000", "-s", "10.0.0.2:22", "--connect-timeout", "7"]);
        let CmdInput::Endpoint(ep, opts) = input else {
            panic!("expected an endpoint");
        };
        assert_eq!(ep.listen, "127.0.0.1:7000");
        assert_eq!(ep.seed.as_deref(), Some("10.0.0.2:22"));
        assert_eq!(ep.connect_timeout, Some(7));
        assert_eq!(opts.endpoint.connect_timeout, Some(7));
        assert!(opts.endpoint.seed.is_none());
    }

    #[test]
    fn config_keeps_overrides() {
        let input = scan_from(&["pivot", "-c", "pivot.toml", "--log-level", "debug", "-b", "8192"]);
        let CmdInput::Config(path, opts) = input else {
            panic!("expected a config path");
        };
        assert_eq!(path, "pivot.toml");
        assert_eq!(opts.network.buf_size, Some(8192));
        assert!(!opts.log.is_empty());
    }
}
