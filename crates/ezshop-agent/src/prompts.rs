// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assistant persona and context block layout.

use ezshop_core::HistoryPair;
use ezshop_core::types::{SearchCollection, SearchItem, UserSummary};
use ezshop_router::prompt::CATEGORIES;
use ezshop_router::render_history;

const PERSONA: &str = "Bạn là một nhân viên chăm sóc khách hàng trên sàn thương mại điện tử EZShop. \
Nhiệm vụ của bạn là hỗ trợ khách hàng về sản phẩm và các nhu cầu mua sắm dựa trên bối cảnh cuộc trò chuyện.

Bạn sẽ nhận được:
- Ý định và yêu cầu của khách hàng
- Lịch sử trò chuyện gần đây
- Tóm tắt thông tin khách hàng
- Danh sách sản phẩm liên quan hoặc chính sách hỗ trợ/FAQ, nếu có
Nếu yêu cầu không có gì đặc biệt, hãy dựa vào các sản phẩm tìm được từ hình ảnh khách hàng gửi để trả lời.

Nếu chưa có thông tin cá nhân của khách hàng, hãy hỏi một vài thông tin cơ bản như tên, email hoặc số điện thoại.
Đọc kỹ lịch sử trò chuyện, hiểu yêu cầu, rồi tìm trong ngữ cảnh những gì có thể dùng để trả lời.
Nếu không có đúng sản phẩm khách cần, hãy lịch sự gợi ý một lựa chọn khác có trong ngữ cảnh.

Hãy lịch sự, vui vẻ và dùng lại từ khóa của khách hàng. Câu trả lời gồm:
- Trả lời câu hỏi
- Gợi ý sản phẩm đi kèm hoặc những việc bạn có thể giúp thêm
- Các mã và chương trình giảm giá hiện có

EZShop là sàn thương mại điện tử tại Việt Nam với nhiều chương trình khuyến mãi hấp dẫn.
Các ngành hàng: ";

/// System prompt for reply synthesis.
pub fn persona() -> String {
    format!("{PERSONA}{}", CATEGORIES.join(", "))
}

/// Context for an image turn. Retrieval always runs on this path.
pub fn image_context(
    intent: &str,
    items: &[SearchItem],
    history: &[HistoryPair],
    summary: &UserSummary,
) -> String {
    format!(
        "User's intent: {intent}\nRelevant products:{}\nRecent Conversations:{}\nUser Summary:{}",
        render_items(items),
        render_history(history),
        summary.to_prompt_json(),
    )
}

/// Context for a text turn. `retrieved` is `None` when no search ran.
pub fn text_context(
    intent: &str,
    query: &str,
    history: &[HistoryPair],
    summary: &UserSummary,
    retrieved: Option<(SearchCollection, &[SearchItem])>,
) -> String {
    let mut context = format!(
        "User's intent: {intent}\nUser query: {query}\nRecent Conversations:{}\nUser Summary:{}",
        render_history(history),
        summary.to_prompt_json(),
    );
    if let Some((collection, items)) = retrieved {
        let label = match collection {
            SearchCollection::Products => "Relevant products",
            SearchCollection::Faq => "Relevant FAQ",
        };
        context.push_str(&format!("\n{label}:{}", render_items(items)));
    }
    context
}

fn render_items(items: &[SearchItem]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}
