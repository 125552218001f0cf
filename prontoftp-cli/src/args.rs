use argh::FromArgs;

#[derive(FromArgs)]
#[argh(description = "prontoftp - interactive FTP/FTPS client

Please, report issues to <https://github.com/prontoftp/prontoftp>")]
pub struct Args {
    #[argh(switch, short = 'D', description = "enable TRACE log level")]
    pub debug: bool,
    #[argh(switch, short = 'v', description = "enable INFO log level")]
    pub verbose: bool,
    #[argh(switch, short = 'V', description = "print version")]
    pub version: bool,
    #[argh(positional, description = "host to connect to at startup (addr:port)")]
    pub host: Option<String>,
}
