//! Prompt assembly for tweet generation.

use super::model::Prompt;
use crate::types::GenerationRequest;

/// Fixed system instruction: persona, length, the three tones, and the
/// JSON shape the parser expects back.
pub const SYSTEM_PROMPT: &str = "당신은 트위터 헤비유저처럼 말해야 하고, 광고처럼 보이면 안 됩니다.
문장은 1~2줄, 가볍고 툭 던지는 말투로 작성해주세요.
메뉴, 사진, 만족도 정보를 반영해서 TL에 올릴 법한 트윗을 만들어주세요.

다음 3가지 톤으로 트윗을 작성해주세요:
1. 솔직톤: 직설적이고 가벼운 톤
2. 드립톤: 트위터 밈과 자조적 개그가 섞인 톤
3. 극단톤: 극찬 또는 혹평, TL에서 던지는 킹받는 멘트

JSON 형식으로 응답해주세요:
{
  \"variations\": [
    {\"content\": \"트윗 내용\", \"tone\": \"솔직톤\"},
    {\"content\": \"트윗 내용\", \"tone\": \"드립톤\"},
    {\"content\": \"트윗 내용\", \"tone\": \"극단톤\"}
  ]
}";

/// Used in place of a missing restaurant name.
pub const UNKNOWN_RESTAURANT: &str = "알 수 없음";

/// The text part of the user turn.
pub fn user_prompt(request: &GenerationRequest) -> String {
    let name = request
        .restaurant_name
        .as_deref()
        .unwrap_or(UNKNOWN_RESTAURANT);
    format!(
        "가게: {}\n메뉴: {}\n만족도: {}\n사진: 첨부된 음식 사진들을 분석해서 트윗에 반영해주세요.",
        name,
        request.menus.join(", "),
        request.satisfaction
    )
}

pub fn build_prompt(request: &GenerationRequest) -> Prompt {
    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user_text: user_prompt(request),
        images: request.images.clone(),
    }
}
