// Team-name identity across sources.
//
// The sale sites print clipped names ("레스터C", "A빌라") while the public API
// spells them out ("레스터시티", "아스톤빌라"). `match_team` decides whether two
// spellings name the same club, and how sure it is.

use crate::GameEntry;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Below this a pair is treated as different teams.
pub const MATCH_THRESHOLD: f64 = 0.6;

const EXACT: f64 = 1.0;
const ALIAS: f64 = 0.95;
const SUBSTRING: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Exact,
    AliasMap,
    Substring,
    Fuzzy,
    None,
}

impl MatchMethod {
    /// Lower is stronger evidence.
    fn rank(&self) -> u8 {
        match self {
            MatchMethod::Exact => 0,
            MatchMethod::AliasMap => 1,
            MatchMethod::Substring => 2,
            MatchMethod::Fuzzy => 3,
            MatchMethod::None => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchResult {
    pub similarity: f64,
    pub method: MatchMethod,
}

impl MatchResult {
    const NONE: MatchResult = MatchResult { similarity: 0.0, method: MatchMethod::None };

    pub fn is_match(&self) -> bool {
        self.similarity >= MATCH_THRESHOLD
    }

    /// Higher similarity wins; equal similarity goes to the stronger method.
    fn beats(&self, other: &MatchResult) -> bool {
        self.similarity > other.similarity
            || (self.similarity == other.similarity && self.method.rank() < other.method.rank())
    }
}

/// One game of slate A paired with the game of slate B that names the same teams.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GamePairing {
    pub index_a: usize,
    pub index_b: usize,
    pub home: MatchResult,
    pub away: MatchResult,
}

impl GamePairing {
    pub fn confidence(&self) -> f64 {
        (self.home.similarity + self.away.similarity) / 2.0
    }
}

/// Curated spellings of the same club. Each row is a group; two names are
/// aliases when some group holds both.
pub const DEFAULT_ALIAS_GROUPS: &[&[&str]] = &[
    // Premier League
    &["레스터C", "레스터시티", "레스터", "레스터 시티"],
    &["맨체스U", "맨체스터유나이티드", "맨유", "맨체스터U", "맨체스터 유나이티드"],
    &["맨체스C", "맨체스터시티", "맨시티", "맨체스터C", "맨체스터 시티"],
    &["노팅엄포", "노팅엄F", "노팅엄포레스트", "노팅엄포리스트", "노팅엄", "노팅엄 포리스트"],
    &["A빌라", "아스톤빌라", "아스톤 빌라", "빌라"],
    &["크리스탈P", "크리스탈팰리스", "크리스탈 팰리스", "팰리스"],
    &["뉴캐슬U", "뉴캐슬유나이티드", "뉴캐슬", "뉴캐슬 유나이티드"],
    &["웨스트햄U", "웨스트햄유나이티드", "웨스트햄", "웨스트햄 유나이티드"],
    &["토트넘H", "토트넘홋스퍼", "토트넘", "토트넘홋", "스퍼스"],
    &["브라이튼H", "브라이튼호브알비온", "브라이튼", "브라이튼 호브 알비온"],
    &["울버햄튼W", "울버햄튼원더러스", "울브스", "울버햄튼"],
    &["입스위치T", "입스위치타운", "입스위치", "입스위치 타운"],
    &["사우샘프턴", "사우샘프턴FC", "세인츠"],
    // Championship
    &["노리치C", "노리치시티", "노리치", "노리치 시티"],
    &["셰필드U", "셰필드유나이티드", "셰필드", "셰필드 유나이티드"],
    &["셰필드W", "셰필드웬즈데이", "셰필드 웬즈데이"],
    &["더비카운", "더비카운티", "더비", "더비 카운티"],
    &["스토크C", "스토크시티", "스토크", "스토크 시티"],
    &["스완지C", "스완지시티", "스완지", "스완지 시티"],
    &["카디프C", "카디프시티", "카디프", "카디프 시티"],
    &["브리스틀C", "브리스틀시티", "브리스틀", "브리스틀 시티"],
    &["코번트리C", "코번트리시티", "코번트리", "코번트리 시티"],
    &["버밍엄C", "버밍엄시티", "버밍엄", "버밍엄 시티"],
    &["헐C", "헐시티", "헐", "헐 시티"],
    &["리즈U", "리즈유나이티드", "리즈", "리즈 유나이티드"],
    &["QPR", "퀸즈파크레인저스", "퀸즈 파크 레인저스"],
    &["WBA", "웨스트브로미치앨비언", "웨스트브롬", "웨스트 브로미치"],
    &["플리머스A", "플리머스아가일", "플리머스", "플리머스 아가일"],
    &["옥스포드U", "옥스포드유나이티드", "옥스포드", "옥스포드 유나이티드"],
    &["포츠머스", "포츠머스FC"],
    &["프레스턴NE", "프레스턴노스엔드", "프레스턴", "프레스턴 노스 엔드"],
    &["밀월", "밀월FC"],
    &["루턴T", "루턴타운", "루턴", "루턴 타운"],
    // KBO
    &["삼성", "삼성라이온즈", "삼성 라이온즈"],
    &["롯데", "롯데자이언츠", "롯데 자이언츠"],
    &["두산", "두산베어스", "두산 베어스"],
    &["LG", "LG트윈스", "LG 트윈스"],
    &["KIA", "KIA타이거즈", "KIA 타이거즈"],
    &["KT", "KT위즈", "KT 위즈"],
    &["NC", "NC다이노스", "NC 다이노스"],
    &["SSG", "SSG랜더스", "SSG 랜더스"],
    &["키움", "키움히어로즈", "키움 히어로즈"],
    &["한화", "한화이글스", "한화 이글스"],
    // KBL
    &["울산모비스", "울산현대모비스피버스", "울산현대모비스", "울산 현대모비스", "현대모비스", "모비스"],
    &["서울삼성", "서울삼성썬더스", "서울 삼성 썬더스", "삼성썬더스"],
    &["원주DB", "원주DB프로미", "원주 DB 프로미", "DB프로미"],
    &["안양KGC", "안양KGC인삼공사", "안양 KGC", "KGC인삼공사", "안양정관장", "안양정관장레드부스터", "정관장"],
    &["고양소노", "고양소노스카이거너스", "고양 소노", "소노스카이거너스", "소노"],
    &["부산KCC", "부산KCC이지스", "부산 KCC", "KCC이지스"],
    &["전주KCC", "전주KCC이지스"],
    &["대구한국가스", "대구한국가스공사", "대구 한국가스공사", "대구가스공사", "한국가스공사", "가스공사"],
    &["서울SK", "서울SK나이츠", "서울 SK", "SK나이츠"],
    &["수원KT", "수원KT소닉붐", "수원 KT", "KT소닉붐"],
    &["창원LG", "창원LG세이커스", "창원 LG", "LG세이커스"],
    // NBA
    &["미네소타", "미네소타팀버울브스", "미네소타 팀버울브스", "팀버울브스"],
    &["LA레이커스", "로스앤젤레스레이커스", "LA 레이커스", "레이커스", "LAL"],
    &["LA클리퍼스", "로스앤젤레스클리퍼스", "LA 클리퍼스", "클리퍼스"],
    &["골든스테이트", "골든스테이트워리어스", "골든스테이트 워리어스", "워리어스", "GSW"],
    &["샌안토니오", "샌안토니오스퍼스", "샌안토니오 스퍼스"],
    &["뉴올리언스", "뉴올리언스펠리컨스", "뉴올리언스 펠리컨스", "펠리컨스"],
    &["오클라호마시티", "오클라호마시티썬더", "오클라호마시티 썬더", "썬더"],
    &["포틀랜드", "포틀랜드트레일블레이저스", "포틀랜드 트레일블레이저스", "블레이저스"],
    &["유타", "유타재즈", "유타 재즈", "재즈"],
    &["덴버", "덴버너겟츠", "덴버 너겟츠", "너겟츠"],
    &["피닉스", "피닉스선즈", "피닉스 선즈", "선즈"],
    &["새크라멘토", "새크라멘토킹스", "새크라멘토 킹스", "킹스"],
    &["시카고", "시카고불스", "시카고 불스", "불스"],
    &["클리블랜드", "클리블랜드캐벌리어스", "클리블랜드 캐벌리어스", "캐벌리어스"],
    &["디트로이트", "디트로이트피스톤스", "디트로이트 피스톤스", "피스톤스"],
    &["인디애나", "인디애나페이서스", "인디애나 페이서스", "페이서스"],
    &["밀워키", "밀워키벅스", "밀워키 벅스", "벅스"],
    &["애틀랜타", "애틀랜타호크스", "애틀랜타 호크스", "호크스"],
    &["샬럿", "샬럿호네츠", "샬럿 호네츠", "호네츠"],
    &["마이애미", "마이애미히트", "마이애미 히트", "히트"],
    &["올랜도", "올랜도매직", "올랜도 매직", "매직"],
    &["워싱턴", "워싱턴위저즈", "워싱턴 위저즈", "위저즈"],
    &["보스턴", "보스턴셀틱스", "보스턴 셀틱스", "셀틱스"],
    &["브루클린", "브루클린네츠", "브루클린 네츠", "네츠"],
    &["뉴욕", "뉴욕닉스", "뉴욕 닉스", "닉스"],
    &["필라델피아", "필라델피아세븐티식서스", "필라델피아 76ers", "식서스"],
    &["토론토", "토론토랩터스", "토론토 랩터스", "랩터스"],
    &["댈러스", "댈러스매버릭스", "댈러스 매버릭스", "매버릭스"],
    &["휴스턴", "휴스턴로케츠", "휴스턴 로케츠", "로케츠"],
    &["멤피스", "멤피스그리즐리스", "멤피스 그리즐리스", "그리즐리스"],
];

/// Decides whether two spellings name the same team.
///
/// Rules, first hit wins:
/// 1. normalized equality (1.0)
/// 2. both names in one alias group (0.95)
/// 3. one normalized name contains the other (0.8)
/// 4. normalized Levenshtein ratio, kept when ≥ 0.6
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    /// normalized name → indices of the groups holding it
    alias_index: HashMap<String, Vec<usize>>,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::with_aliases(DEFAULT_ALIAS_GROUPS.iter().map(|g| g.iter().copied()))
    }

    pub fn with_aliases<G, S>(groups: impl IntoIterator<Item = G>) -> Self
    where
        G: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut alias_index: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, group) in groups.into_iter().enumerate() {
            for name in group {
                let key = normalize(name.as_ref());
                if key.is_empty() {
                    continue;
                }
                let entry = alias_index.entry(key).or_default();
                if !entry.contains(&idx) {
                    entry.push(idx);
                }
            }
        }
        Self { alias_index }
    }

    pub fn match_team(&self, a: &str, b: &str) -> MatchResult {
        let (na, nb) = (normalize(a), normalize(b));
        if na.is_empty() || nb.is_empty() {
            return MatchResult::NONE;
        }
        if na == nb {
            return MatchResult { similarity: EXACT, method: MatchMethod::Exact };
        }
        if self.share_group(&na, &nb) {
            return MatchResult { similarity: ALIAS, method: MatchMethod::AliasMap };
        }
        if na.contains(&nb) || nb.contains(&na) {
            return MatchResult { similarity: SUBSTRING, method: MatchMethod::Substring };
        }

        let ratio = strsim::normalized_levenshtein(&na, &nb);
        if ratio >= MATCH_THRESHOLD {
            MatchResult { similarity: ratio, method: MatchMethod::Fuzzy }
        } else {
            MatchResult::NONE
        }
    }

    /// Best candidate at or above the threshold. Ties go to the stronger
    /// method, then to the earlier candidate.
    pub fn find_best_match<S: AsRef<str>>(
        &self,
        name: &str,
        candidates: &[S],
    ) -> Option<(usize, MatchResult)> {
        let mut best: Option<(usize, MatchResult)> = None;
        for (idx, candidate) in candidates.iter().enumerate() {
            let result = self.match_team(name, candidate.as_ref());
            if !result.is_match() {
                continue;
            }
            if best.is_none_or(|(_, current)| result.beats(&current)) {
                best = Some((idx, result));
            }
        }
        best
    }

    /// Pair each game of `a` with the unused game of `b` whose home and away
    /// teams both match, preferring the highest mean confidence. Games with no
    /// partner are left out.
    pub fn match_games(&self, a: &[GameEntry], b: &[GameEntry]) -> Vec<GamePairing> {
        let mut used: HashSet<usize> = HashSet::new();
        let mut pairings = Vec::new();

        for (index_a, game_a) in a.iter().enumerate() {
            let mut best: Option<GamePairing> = None;
            for (index_b, game_b) in b.iter().enumerate() {
                if used.contains(&index_b) {
                    continue;
                }
                let home = self.match_team(&game_a.home_team, &game_b.home_team);
                let away = self.match_team(&game_a.away_team, &game_b.away_team);
                if !home.is_match() || !away.is_match() {
                    continue;
                }
                let candidate = GamePairing { index_a, index_b, home, away };
                if best
                    .as_ref()
                    .is_none_or(|current| candidate.confidence() > current.confidence())
                {
                    best = Some(candidate);
                }
            }
            if let Some(pairing) = best {
                used.insert(pairing.index_b);
                pairings.push(pairing);
            }
        }
        pairings
    }

    fn share_group(&self, a: &str, b: &str) -> bool {
        match (self.alias_index.get(a), self.alias_index.get(b)) {
            (Some(ga), Some(gb)) => ga.iter().any(|g| gb.contains(g)),
            _ => false,
        }
    }
}

/// Trim, lowercase, and drop whitespace and punctuation.
pub fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_ascii_punctuation() && *c != '·')
        .flat_map(char::to_lowercase)
        .collect()
}
