/// KSPO public API raw wire types: serde shapes for the `todz_api_tb_match_mgmt_i` endpoint.
/// These map to the clean domain types inside `sources::kspo`; nothing else sees these names.
use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize, Default, Clone)]
pub struct MatchListResponse {
    pub response: Option<ResponseEnvelope>,
}

impl MatchListResponse {
    /// `response.body.items.item`, which the API sends as an array, a single
    /// object, or omits entirely (empty string `items` on days without matches).
    pub fn into_items(self) -> Vec<MatchItem> {
        self.response
            .and_then(|r| r.body)
            .and_then(|b| b.items)
            .and_then(|i| i.item)
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
    }

    /// The header's message when `resultCode` reports anything but `00`
    /// (bad service key, quota exceeded, ...).
    pub fn api_error(&self) -> Option<String> {
        let header = self.response.as_ref()?.header.as_ref()?;
        let code = header.result_code.as_deref()?.trim();
        if code == "00" {
            return None;
        }
        let msg = header.result_msg.as_deref().unwrap_or_default().trim();
        Some(format!("kspo result {code}: {msg}"))
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ResponseEnvelope {
    pub header: Option<ResponseHeader>,
    pub body: Option<ResponseBody>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ResponseHeader {
    #[serde(rename = "resultCode")]
    pub result_code: Option<String>,
    #[serde(rename = "resultMsg")]
    pub result_msg: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ResponseBody {
    #[serde(default, deserialize_with = "items_or_blank")]
    pub items: Option<Items>,
    #[serde(rename = "totalCount", default, deserialize_with = "lenient_u32")]
    pub total_count: Option<u32>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Items {
    pub item: Option<OneOrMany<MatchItem>>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(v) => v,
            OneOrMany::One(t) => vec![t],
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct MatchItem {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub row_num: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub turn_no: Option<u32>,
    pub hteam_han_nm: Option<String>,
    pub ateam_han_nm: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub match_ymd: Option<String>, // YYYYMMDD
    #[serde(default, deserialize_with = "lenient_string")]
    pub match_tm: Option<String>, // HHMM, sometimes without the leading zero
    pub obj_prod_nm: Option<String>, // "토토/프로토"
    pub match_sport_han_nm: Option<String>, // "축구" | "농구"
    pub leag_han_nm: Option<String>,
}

// The API is inconsistent about quoting numbers: `"row_num": "3"` and
// `"row_num": 3` both occur, as do empty strings for missing values.
#[derive(Deserialize)]
#[serde(untagged)]
enum StrOrNum {
    Num(u64),
    Float(f64),
    Str(String),
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<StrOrNum>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| match v {
        StrOrNum::Num(n) => Some(n.to_string()),
        StrOrNum::Float(f) => Some(format!("{}", f as u64)),
        StrOrNum::Str(s) => {
            let s = s.trim().to_owned();
            (!s.is_empty()).then_some(s)
        }
    }))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<StrOrNum>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| match v {
        StrOrNum::Num(n) => u32::try_from(n).ok(),
        StrOrNum::Float(f) if f >= 0.0 => Some(f as u32),
        StrOrNum::Float(_) => None,
        StrOrNum::Str(s) => s.trim().parse().ok(),
    }))
}

fn items_or_blank<'de, D>(deserializer: D) -> Result<Option<Items>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ItemsOrBlank {
        Items(Items),
        Blank(String),
    }

    Ok(match Option::<ItemsOrBlank>::deserialize(deserializer)? {
        Some(ItemsOrBlank::Items(items)) => Some(items),
        Some(ItemsOrBlank::Blank(_)) | None => None,
    })
}
