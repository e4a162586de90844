//! Argument parsing for the deskbridge UI binary.

pub const DEFAULT_URL: &str = "ws://127.0.0.1:4780/ws";
pub const DEFAULT_SAMPLES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Simulation {
    Cpu,
    Leak,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArgs {
    pub url: Option<String>,
    pub samples: usize,
    pub simulate: Option<Simulation>,
    pub open_logs: bool,
}

pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "deskbridge".into());
    let usage = format!(
        "Usage: {prog} [--samples N|-n N] [--simulate cpu|leak|error|-s …] [--open-logs] [ws://HOST:PORT/ws]"
    );

    let mut url: Option<String> = None;
    let mut samples = DEFAULT_SAMPLES;
    let mut simulate: Option<Simulation> = None;
    let mut open_logs = false;

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(usage),
            "--samples" | "-n" => {
                samples = it
                    .next()
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(|| usage.clone())?;
            }
            "--simulate" | "-s" => {
                simulate = Some(parse_simulation(
                    it.next().as_deref().unwrap_or(""),
                    &usage,
                )?);
            }
            "--open-logs" => {
                open_logs = true;
            }
            _ if arg.starts_with("--samples=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    samples = v.parse().map_err(|_| usage.clone())?;
                }
            }
            _ if arg.starts_with("--simulate=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    simulate = Some(parse_simulation(v, &usage)?);
                }
            }
            _ => {
                if url.is_none() {
                    url = Some(arg);
                } else {
                    return Err(format!("Unexpected argument `{arg}`. {usage}"));
                }
            }
        }
    }

    Ok(ParsedArgs {
        url,
        samples,
        simulate,
        open_logs,
    })
}

fn parse_simulation(v: &str, usage: &str) -> Result<Simulation, String> {
    match v {
        "cpu" => Ok(Simulation::Cpu),
        "leak" => Ok(Simulation::Leak),
        "error" => Ok(Simulation::Error),
        _ => Err(format!("Unknown simulation `{v}`. {usage}")),
    }
}
