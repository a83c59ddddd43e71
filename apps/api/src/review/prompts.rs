// Prompt for the review analysis call. The reply format defined here is the
// exact line format `review::parser` understands; change both together.

/// Instruction header, kept in the vendor's working language. Example tags are at least two
/// characters long so they survive the tag length filter. The numbered reviews follow `评论：`.
pub const REVIEW_ANALYSIS_PROMPT: &str = r#"
你是一个评论分析师。请对下列每条评论执行以下操作：

1. 判断是否与 "餐厅体验/食品/服务/外卖" 相关：
    - 如果无关，请返回： <编号>. Irrelevant
2. 如果有关，请执行：
    - 分类情绪：Positive 或 Negative
    - 提取1-3个关键词（名词/名词短语）
    - 给出1-2个标签（如：服务、食品、餐厅体验、外卖）

输出格式：
<编号>. Sentiment: <Positive/Negative> | Keywords: <关键词> | Tags: <标签>

评论：
"#;

/// Builds the full prompt: the fixed header followed by one `"{n}. {review}"` line per review,
/// numbered from 1 in submission order.
pub fn build_prompt(reviews: &[String]) -> String {
    let mut prompt = String::from(REVIEW_ANALYSIS_PROMPT);
    for (idx, review) in reviews.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", idx + 1, review));
    }
    prompt
}
