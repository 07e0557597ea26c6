use clap::{Arg, ArgMatches, Command};

/// `server` 子命令的覆盖参数；未指定时沿用配置文件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerArgs {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub workers: Option<usize>,
}

impl ServerArgs {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            host: matches.get_one::<String>("host").cloned(),
            port: matches.get_one::<u16>("port").copied(),
            workers: matches.get_one::<usize>("workers").copied(),
        }
    }
}

/// 解析后的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Server(ServerArgs),
    Version,
}

/// 构建命令行应用；不带子命令时等同于 `server`
pub fn build_app(name: &'static str) -> Command {
    Command::new(name)
        .version(env!("CARGO_PKG_VERSION"))
        .about("traverse Web 服务")
        .subcommand(
            Command::new("server")
                .about("启动 Web 服务器")
                .arg(
                    Arg::new("host")
                        .long("host")
                        .value_name("HOST")
                        .help("覆盖服务器主机地址 (server.host)"),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .value_parser(clap::value_parser!(u16))
                        .help("覆盖服务器端口 (server.port)"),
                )
                .arg(
                    Arg::new("workers")
                        .short('w')
                        .long("workers")
                        .value_name("WORKERS")
                        .value_parser(clap::value_parser!(usize))
                        .help("覆盖工作线程数 (server.workers)"),
                ),
        )
        .subcommand(Command::new("version").about("显示版本信息"))
}

pub fn parse_command(matches: &ArgMatches) -> CliCommand {
    match matches.subcommand() {
        Some(("version", _)) => CliCommand::Version,
        Some(("server", sub_matches)) => CliCommand::Server(ServerArgs::from_matches(sub_matches)),
        _ => CliCommand::Server(ServerArgs::default()),
    }
}

/// 打印版本信息
pub fn print_version(name: &str) {
    println!("{} {}", name, env!("CARGO_PKG_VERSION"));
}
