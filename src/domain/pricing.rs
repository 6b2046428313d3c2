use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePrice {
    pub quality: &'static str,
    pub size: &'static str,
    pub api_cost: f64,
    pub price_with_50_margin: f64,
    pub credits_to_charge: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPrice {
    pub duration: &'static str,
    pub resolution: &'static str,
    pub motion: &'static str,
    pub api_cost: f64,
    pub price_with_30_margin: f64,
    pub credits_to_charge: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CreditPackage {
    pub id: &'static str,
    pub name: &'static str,
    pub price: u32,
    pub credits: u32,
    pub description: &'static str,
    pub popular: bool,
}

const fn image(quality: &'static str, size: &'static str, api_cost: f64, margin: f64, credits: i32) -> ImagePrice {
    ImagePrice { quality, size, api_cost, price_with_50_margin: margin, credits_to_charge: credits }
}

const fn video(
    duration: &'static str,
    resolution: &'static str,
    motion: &'static str,
    api_cost: f64,
    margin: f64,
    credits: i32,
) -> VideoPrice {
    VideoPrice { duration, resolution, motion, api_cost, price_with_30_margin: margin, credits_to_charge: credits }
}

pub const IMAGE_PRICING: [ImagePrice; 9] = [
    image("low", "1024x1024", 0.011, 0.0165, 2),
    image("low", "1024x1536", 0.016, 0.024, 3),
    image("low", "1536x1024", 0.016, 0.024, 3),
    image("medium", "1024x1024", 0.042, 0.063, 7),
    image("medium", "1024x1536", 0.063, 0.0945, 10),
    image("medium", "1536x1024", 0.063, 0.0945, 10),
    image("high", "1024x1024", 0.167, 0.2505, 25),
    image("high", "1024x1536", 0.25, 0.375, 38),
    image("high", "1536x1024", 0.25, 0.375, 38),
];

/// Not every combination is offered; 8s at 1080p and smooth motion at
/// 1080p or 8s have no row.
pub const VIDEO_PRICING: [VideoPrice; 10] = [
    video("5s", "360p", "normal", 0.30, 0.39, 39),
    video("5s", "360p", "smooth", 0.60, 0.78, 78),
    video("8s", "360p", "normal", 0.60, 0.78, 78),
    video("5s", "540p", "normal", 0.30, 0.39, 39),
    video("5s", "540p", "smooth", 0.60, 0.78, 78),
    video("8s", "540p", "normal", 0.60, 0.78, 78),
    video("5s", "720p", "normal", 0.40, 0.52, 52),
    video("5s", "720p", "smooth", 0.80, 1.04, 104),
    video("8s", "720p", "normal", 0.80, 1.04, 104),
    video("5s", "1080p", "normal", 0.80, 1.04, 104),
];

pub const CREDIT_PACKAGES: [CreditPackage; 3] = [
    CreditPackage {
        id: "starter",
        name: "Starter",
        price: 9,
        credits: 1000,
        description: "Perfect for trying out AI advertising",
        popular: false,
    },
    CreditPackage {
        id: "professional",
        name: "Professional",
        price: 18,
        credits: 2200,
        description: "Great value for regular creators",
        popular: true,
    },
    CreditPackage {
        id: "business",
        name: "Business",
        price: 34,
        credits: 4000,
        description: "Maximum value for power users",
        popular: false,
    },
];

pub fn image_pricing_details(quality: &str, size: &str) -> Option<&'static ImagePrice> {
    IMAGE_PRICING.iter().find(|p| p.quality == quality && p.size == size)
}

/// Credits charged for one image, or `None` when the pair is not offered.
pub fn image_credits(quality: &str, size: &str) -> Option<i32> {
    image_pricing_details(quality, size).map(|p| p.credits_to_charge)
}

pub fn video_pricing_details(duration: &str, resolution: &str, motion: &str) -> Option<&'static VideoPrice> {
    VIDEO_PRICING
        .iter()
        .find(|p| p.duration == duration && p.resolution == resolution && p.motion == motion)
}

/// Credits charged for one video. `duration` is the table key, e.g. `"5s"`.
pub fn video_credits(duration: &str, resolution: &str, motion: &str) -> Option<i32> {
    video_pricing_details(duration, resolution, motion).map(|p| p.credits_to_charge)
}

pub fn credit_package(id: &str) -> Option<&'static CreditPackage> {
    CREDIT_PACKAGES.iter().find(|p| p.id == id)
}

impl CreditPackage {
    pub fn credits_per_dollar(&self) -> f64 {
        self.credits as f64 / self.price as f64
    }
}

pub fn format_quality(quality: &str) -> String {
    let mut chars = quality.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn format_size(size: &str) -> String {
    let (width, height) = size.split_once('x').unwrap_or((size, ""));
    if width == height {
        return format!("Square ({size})");
    }
    match (width.parse::<u32>(), height.parse::<u32>()) {
        (Ok(w), Ok(h)) if w > h => format!("Landscape ({size})"),
        _ => format!("Portrait ({size})"),
    }
}

pub fn format_duration(duration: &str) -> &'static str {
    if duration == "5s" { "5 seconds" } else { "8 seconds" }
}

pub fn format_resolution(resolution: &str) -> String {
    match resolution {
        "360p" => "360p (SD)".into(),
        "540p" => "540p (QHD)".into(),
        "720p" => "720p (HD)".into(),
        "1080p" => "1080p (Full HD)".into(),
        other => other.to_string(),
    }
}

pub fn format_motion_mode(motion: &str) -> &'static str {
    if motion == "normal" { "Normal Motion" } else { "Smooth Motion" }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePriceListing {
    #[serde(flatten)]
    pub price: &'static ImagePrice,
    pub quality_label: String,
    pub size_label: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPriceListing {
    #[serde(flatten)]
    pub price: &'static VideoPrice,
    pub duration_label: &'static str,
    pub resolution_label: String,
    pub motion_label: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageListing {
    #[serde(flatten)]
    pub package: &'static CreditPackage,
    pub credits_per_dollar: f64,
}

/// The published price list, with display labels.
#[derive(Debug, Serialize)]
pub struct PriceList {
    pub image: Vec<ImagePriceListing>,
    pub video: Vec<VideoPriceListing>,
    pub packages: Vec<PackageListing>,
}

pub fn price_list() -> PriceList {
    PriceList {
        image: IMAGE_PRICING
            .iter()
            .map(|price| ImagePriceListing {
                price,
                quality_label: format_quality(price.quality),
                size_label: format_size(price.size),
            })
            .collect(),
        video: VIDEO_PRICING
            .iter()
            .map(|price| VideoPriceListing {
                price,
                duration_label: format_duration(price.duration),
                resolution_label: format_resolution(price.resolution),
                motion_label: format_motion_mode(price.motion),
            })
            .collect(),
        packages: CREDIT_PACKAGES
            .iter()
            .map(|package| PackageListing { package, credits_per_dollar: package.credits_per_dollar() })
            .collect(),
    }
}
