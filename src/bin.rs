use std::env;
use std::process;

use pivot::cmd;
use pivot::conf::{Config, ConfError, FullConf, LogConf, DnsConf, NetConf};
use pivot::relay;
use pivot::ENV_CONFIG;

use pivot_core::endpoint::Endpoint;

fn main() {
    let conf = load_conf().unwrap_or_else(|e| {
        eprintln!("{}", e);
        process::exit(1);
    });

    if let Err(e) = start_from_conf(conf) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn load_conf() -> Result<FullConf, ConfError> {
    if let Ok(conf_str) = env::var(ENV_CONFIG) {
        return FullConf::from_conf_str(&conf_str);
    }

    use cmd::CmdInput;
    match cmd::scan() {
        CmdInput::Endpoint(ep, opts) => {
            let mut conf = FullConf::default();
            conf.add_endpoint(ep).apply_cmd_opts(opts);
            Ok(conf)
        }
        CmdInput::Config(path, opts) => {
            let mut conf = FullConf::from_conf_file(&path)?;
            conf.apply_cmd_opts(opts);
            Ok(conf)
        }
        CmdInput::None => process::exit(0),
    }
}

fn start_from_conf(full: FullConf) -> Result<(), ConfError> {
    let FullConf {
        log: log_conf,
        dns: dns_conf,
        network: net_conf,
        endpoints: eps_conf,
    } = full;

    setup_log(log_conf)?;
    setup_dns(dns_conf)?;
    setup_network(net_conf);

    let eps = eps_conf
        .into_iter()
        .map(|epc| epc.build())
        .inspect(|x| {
            if let Ok(ep) = x {
                println!("inited: {}", ep)
            }
        })
        .collect::<Result<Vec<Endpoint>, _>>()?;

    if eps.is_empty() {
        return Err(ConfError::Invalid("config", "no endpoint".to_string()));
    }

    execute(eps);
    Ok(())
}

fn setup_log(log: LogConf) -> Result<(), ConfError> {
    println!("log: {}", &log);

    let (level, output) = log
        .build()
        .map_err(|e| ConfError::Invalid("log output", e.to_string()))?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}]{}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(output)
        .apply()
        .map_err(|e| ConfError::Invalid("logger", e.to_string()))
}

fn setup_dns(dns: DnsConf) -> Result<(), ConfError> {
    println!("dns: {}", &dns);

    let (conf, opts) = dns.build()?;
    pivot_core::dns::build(conf, opts);
    Ok(())
}

fn setup_network(net: NetConf) {
    println!("network: {}", &net);

    if let Some(size) = net.buf_size {
        pivot_io::set_buf_size(size);
    }

    #[cfg(all(unix, not(target_os = "android")))]
    {
        use pivot_syscall::{bump_nofile_limit, set_nofile_limit};
        let res = match net.nofile {
            Some(limit) => set_nofile_limit(limit),
            None => bump_nofile_limit(),
        };
        if let Err(e) = res {
            println!("failed to raise nofile limit: {}", e);
        }
    }
}

fn execute(eps: Vec<Endpoint>) {
    #[cfg(feature = "multi-thread")]
    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build();

    #[cfg(not(feature = "multi-thread"))]
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build();

    match rt {
        Ok(rt) => rt.block_on(relay::run(eps)),
        Err(e) => eprintln!("failed to start runtime: {}", e),
    }
}
