//! Animated GFS model forecast maps.
//!
//! Frames are published per model cycle (00, 06, 12 and 18 UTC) and per US
//! region. All frames are fetched at once and stitched into a looping GIF.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Timelike, Utc};
use futures::future::try_join_all;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};
use tracing::{debug, info};

use crate::fetch::decode_png;
use crate::provider::AsyncHttpClient;

use super::WeatherError;

/// Model image archive root.
pub const GFS_BASE_URL: &str = "https://www.tropicaltidbits.com/analysis/models/gfs";

/// Frames per animation.
pub const FRAME_COUNT: usize = 10;

/// Delay between frames.
pub const FRAME_DELAY_MS: u32 = 750;

/// US forecast regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    NorthCentral,
    NorthEast,
    NorthWest,
    SouthCentral,
    SouthEast,
    SouthWest,
}

impl Region {
    /// Every name [`Region::from_str`] accepts.
    pub const NAMES: &'static [&'static str] = &[
        "nc",
        "ne",
        "nw",
        "sc",
        "se",
        "sw",
        "midwest",
        "northeast",
        "northwest",
        "south central",
        "southeast",
        "southwest",
        "texas",
    ];

    /// Two-letter code used in frame file names.
    pub fn code(&self) -> &'static str {
        match self {
            Region::NorthCentral => "nc",
            Region::NorthEast => "ne",
            Region::NorthWest => "nw",
            Region::SouthCentral => "sc",
            Region::SouthEast => "se",
            Region::SouthWest => "sw",
        }
    }
}

impl FromStr for Region {
    type Err = WeatherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nc" | "midwest" => Ok(Region::NorthCentral),
            "ne" | "northeast" => Ok(Region::NorthEast),
            "nw" | "northwest" => Ok(Region::NorthWest),
            "sc" | "texas" | "south central" => Ok(Region::SouthCentral),
            "se" | "southeast" => Ok(Region::SouthEast),
            "sw" | "southwest" => Ok(Region::SouthWest),
            _ => Err(WeatherError::UnknownRegion(s.to_string())),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Latest model cycle label at or before `hour` (UTC).
pub fn model_cycle(hour: u32) -> &'static str {
    match hour {
        0..=5 => "00",
        6..=11 => "06",
        12..=17 => "12",
        _ => "18",
    }
}

/// Fetches GFS frames and builds the animation.
pub struct GfsClient<C: AsyncHttpClient> {
    http_client: C,
    base_url: String,
}

impl<C: AsyncHttpClient> GfsClient<C> {
    pub fn new(http_client: C) -> Self {
        Self {
            http_client,
            base_url: GFS_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Frame URLs for the cycle covering `now`, in playback order.
    pub fn frame_urls(&self, region: Region, now: DateTime<Utc>) -> Vec<String> {
        let run = format!("{}{}", now.format("%Y%m%d"), model_cycle(now.hour()));
        (1..=FRAME_COUNT)
            .map(|n| {
                format!(
                    "{}/{}/gfs_mslp_pcpn_frzn_{}us_{}.png",
                    self.base_url,
                    run,
                    region.code(),
                    n
                )
            })
            .collect()
    }

    /// Looping GIF of the current model run for `region`.
    pub async fn animation(
        &self,
        region: Region,
        now: DateTime<Utc>,
    ) -> Result<Vec<u8>, WeatherError> {
        let urls = self.frame_urls(region, now);
        debug!(region = %region, first = %urls[0], "Fetching GFS frames");

        let images = try_join_all(urls.iter().map(|url| async move {
            let body = self.http_client.get(url).await?;
            decode_png(&body)
        }))
        .await?;

        let delay = Delay::from_numer_denom_ms(FRAME_DELAY_MS, 1);
        let frames = images
            .into_iter()
            .map(|image| Frame::from_parts(image, 0, 0, delay));

        let mut gif = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut gif);
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(|e| WeatherError::Encode(e.to_string()))?;
            encoder
                .encode_frames(frames)
                .map_err(|e| WeatherError::Encode(e.to_string()))?;
        }

        info!(region = %region, bytes = gif.len(), "GFS animation built");
        Ok(gif)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::encode_png;
    use crate::provider::MockAsyncHttpClient;
    use chrono::TimeZone;
    use image::codecs::gif::GifDecoder;
    use image::{AnimationDecoder, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::time::Duration;

    fn frame(colour: [u8; 4]) -> Vec<u8> {
        encode_png(&RgbaImage::from_pixel(8, 8, Rgba(colour))).unwrap()
    }

    #[test]
    fn test_model_cycle() {
        assert_eq!(model_cycle(0), "00");
        assert_eq!(model_cycle(5), "00");
        assert_eq!(model_cycle(6), "06");
        assert_eq!(model_cycle(13), "12");
        assert_eq!(model_cycle(23), "18");
    }

    #[test]
    fn test_region_aliases() {
        assert_eq!("texas".parse::<Region>().unwrap(), Region::SouthCentral);
        assert_eq!("South Central".parse::<Region>().unwrap(), Region::SouthCentral);
        assert_eq!("midwest".parse::<Region>().unwrap(), Region::NorthCentral);
        assert_eq!(" NE ".parse::<Region>().unwrap(), Region::NorthEast);
        for name in Region::NAMES {
            assert!(name.parse::<Region>().is_ok(), "{} should parse", name);
        }
    }

    #[test]
    fn test_unknown_region_lists_choices() {
        let err = "atlantis".parse::<Region>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("atlantis"));
        assert!(message.contains("south central"));
    }

    #[test]
    fn test_frame_urls() {
        let gfs = GfsClient::new(MockAsyncHttpClient::new(Ok(Vec::new())));
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).unwrap();
        let urls = gfs.frame_urls(Region::SouthCentral, now);

        assert_eq!(urls.len(), FRAME_COUNT);
        assert_eq!(
            urls[0],
            "https://www.tropicaltidbits.com/analysis/models/gfs/2024050112/gfs_mslp_pcpn_frzn_scus_1.png"
        );
        assert!(urls[9].ends_with("/2024050112/gfs_mslp_pcpn_frzn_scus_10.png"));
    }

    #[tokio::test]
    async fn test_animation_keeps_frame_order() {
        let client = MockAsyncHttpClient::new(Ok(frame([0, 255, 0, 255])))
            .route("_1.png", Ok(frame([255, 0, 0, 255])))
            .route("_10.png", Ok(frame([0, 0, 255, 255])));
        let gfs = GfsClient::new(client.clone());
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap();

        let gif = gfs.animation(Region::NorthEast, now).await.unwrap();
        assert_eq!(client.call_count(), FRAME_COUNT);

        let frames = GifDecoder::new(Cursor::new(gif))
            .unwrap()
            .into_frames()
            .collect_frames()
            .unwrap();
        assert_eq!(frames.len(), FRAME_COUNT);
        assert_eq!(
            Duration::from(frames[0].delay()),
            Duration::from_millis(u64::from(FRAME_DELAY_MS))
        );

        let first = frames[0].buffer().get_pixel(4, 4);
        let middle = frames[4].buffer().get_pixel(4, 4);
        let last = frames[9].buffer().get_pixel(4, 4);
        assert!(first[0] > 200 && first[1] < 50);
        assert!(middle[1] > 200 && middle[0] < 50);
        assert!(last[2] > 200 && last[0] < 50);
    }

    #[tokio::test]
    async fn test_missing_frame_fails() {
        let client = MockAsyncHttpClient::new(Ok(frame([0, 0, 0, 255]))).route(
            "_7.png",
            Err(crate::provider::ProviderError::Status {
                status: 404,
                url: "frame 7".into(),
            }),
        );
        let gfs = GfsClient::new(client);
        let result = gfs.animation(Region::SouthWest, Utc::now()).await;
        assert!(matches!(result, Err(WeatherError::Provider(_))));
    }
}
