//! Chat command parsing.

/// A request made through `?zip=<command>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// NWS observation for a ZIP code.
    Nws(String),
    /// Wunderground conditions with today's forecast.
    Weather(String),
    /// Wunderground multi-day forecast.
    Forecast(String),
    /// ClimaCell conditions with a precipitation map.
    Conditions(String),
    /// Satellite mosaic with precipitation.
    Precip(String),
    /// Satellite mosaic.
    Satellite(String),
    /// GFS animation for a region.
    Map(String),
    /// A previously generated image.
    Image(String),
    Help,
}

impl Command {
    /// Parses the raw query value; anything unrecognised is [`Command::Help`].
    pub fn parse(raw: &str) -> Self {
        let text = raw.trim();
        let text = text.strip_prefix('!').unwrap_or(text).trim();

        if text.ends_with(".png") || text.ends_with(".gif") {
            return Command::Image(text.to_string());
        }

        let (word, rest) = match text.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (text, ""),
        };
        if rest.is_empty() {
            return Command::Help;
        }

        let rest = rest.to_string();
        match word.to_ascii_lowercase().as_str() {
            "nws" => Command::Nws(rest),
            "weather" => Command::Weather(rest),
            "forecast" => Command::Forecast(rest),
            "conditions" => Command::Conditions(rest),
            "precip" => Command::Precip(rest),
            "satellite" => Command::Satellite(rest),
            "map" => Command::Map(rest),
            _ => Command::Help,
        }
    }
}

/// Reply for [`Command::Help`].
pub const HELP_TEXT: &str = "*Commands:*

`!nws`: get a weather report from the NWS's public data source. Use a zip code, expect results to be from airports.
`!weather`: get the current weather and today's forecast. Use `zip` or `city, state` e.g. `!weather 78703` or `!weather san francisco, ca`
`!forecast`: short-term forecast by zip or city, state
`!conditions`: current conditions and a precipitation map for any place, e.g. `!conditions austin, tx`
`!precip`: get a precipitation map of the region centered on provided zip
`!satellite`: get a recent (as old as a week) satellite of a region centered on a zip
`!map`: animated GFS forecast for a US region, e.g. `!map texas` or `!map ne`";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_bang() {
        assert_eq!(Command::parse("!nws 78701"), Command::Nws("78701".into()));
        assert_eq!(Command::parse("nws 78701"), Command::Nws("78701".into()));
    }

    #[test]
    fn test_argument_is_trimmed() {
        assert_eq!(
            Command::parse("weather   san francisco, ca  "),
            Command::Weather("san francisco, ca".into())
        );
        assert_eq!(Command::parse("MAP texas"), Command::Map("texas".into()));
    }

    #[test]
    fn test_images() {
        assert_eq!(
            Command::parse("satellite-78701-0.png"),
            Command::Image("satellite-78701-0.png".into())
        );
        assert_eq!(
            Command::parse("!map-sc-1.gif"),
            Command::Image("map-sc-1.gif".into())
        );
    }

    #[test]
    fn test_help_fallbacks() {
        assert_eq!(Command::parse(""), Command::Help);
        assert_eq!(Command::parse("weather"), Command::Help);
        assert_eq!(Command::parse("tornado 78701"), Command::Help);
        assert_eq!(Command::parse("help"), Command::Help);
    }
}
