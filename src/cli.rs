use slate_api::{GameType, SourcePreference, SourceTier};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Acquire {
        game_type: GameType,
        force: bool,
        preference: SourcePreference,
        json: bool,
    },
    Compare {
        game_type: GameType,
        source_a: SourceTier,
        source_b: SourceTier,
        json: bool,
    },
    LastRound {
        game_type: GameType,
    },
    CheckNew {
        game_type: GameType,
    },
    Help,
    Version,
}

pub fn parse_args<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        return Err("Missing command".to_owned());
    };

    match command.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "-V" | "--version" => Ok(Command::Version),
        "acquire" => {
            let game_type = game_type_arg(args.next())?;
            let (mut force, mut json) = (false, false);
            let mut preference = SourcePreference::Auto;
            while let Some(flag) = args.next() {
                match flag.as_str() {
                    "--force" | "-f" => force = true,
                    "--json" => json = true,
                    "--source" | "-s" => {
                        let value = args.next().ok_or("--source needs a value")?;
                        preference = value.parse()?;
                    }
                    other => return Err(format!("Unknown argument: {other}")),
                }
            }
            Ok(Command::Acquire { game_type, force, preference, json })
        }
        "compare" => {
            let game_type = game_type_arg(args.next())?;
            let source_a = tier_arg(args.next())?;
            let source_b = tier_arg(args.next())?;
            let mut json = false;
            for flag in args {
                match flag.as_str() {
                    "--json" => json = true,
                    other => return Err(format!("Unknown argument: {other}")),
                }
            }
            Ok(Command::Compare { game_type, source_a, source_b, json })
        }
        "last-round" => {
            let game_type = game_type_arg(args.next())?;
            no_more(args)?;
            Ok(Command::LastRound { game_type })
        }
        "check-new" => {
            let game_type = game_type_arg(args.next())?;
            no_more(args)?;
            Ok(Command::CheckNew { game_type })
        }
        other => Err(format!("Unknown argument: {other}")),
    }
}

fn game_type_arg(arg: Option<String>) -> Result<GameType, String> {
    arg.ok_or_else(|| "Missing game type (soccer_wdl | basketball_w5l)".to_owned())?
        .parse()
}

fn tier_arg(arg: Option<String>) -> Result<SourceTier, String> {
    arg.ok_or_else(|| "Missing source (betman | wisetoto | zentoto | kspo)".to_owned())?
        .parse()
}

fn no_more(mut args: impl Iterator<Item = String>) -> Result<(), String> {
    match args.next() {
        Some(extra) => Err(format!("Unknown argument: {extra}")),
        None => Ok(()),
    }
}

pub fn usage_text() -> &'static str {
    "slate - toto 14-game slate collector

Usage:
  slate acquire <game_type> [--force] [--source auto|betman|wisetoto|zentoto|kspo] [--json]
  slate compare <game_type> <source_a> <source_b> [--json]
  slate last-round <game_type>
  slate check-new <game_type>
  slate --help
  slate --version

Game types:
  soccer_wdl       축구 승무패
  basketball_w5l   농구 승5패

Environment:
  SLATE_STATE_DIR        Directory for saved rounds (default .state)
  SLATE_CACHE_TTL_SECS   In-process cache lifetime (default 300)
  KSPO_API_KEY           Public data portal service key
  KSPO_API_BASE_URL      Public API base URL
  KSPO_DAYS_AHEAD        Days queried from today (default 14)
  BETMAN_BASE_URL, WISETOTO_BASE_URL, ZENTOTO_BASE_URL
  RUST_LOG               Log filter (default info)"
}
