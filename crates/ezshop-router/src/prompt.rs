// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router instructions and message rendering.

use ezshop_core::HistoryPair;
use ezshop_core::types::UserSummary;

/// Shown in place of an empty history.
pub const NO_HISTORY: &str = "No past conversations found.";

/// Top-level categories of the catalogue, as stored in `category_level_1`.
pub const CATEGORIES: &[&str] = &[
    "Thể Thao - Dã Ngoại",
    "Điện Thoại - Máy Tính Bảng",
    "Đồ Chơi - Mẹ & Bé",
    "Balo và Vali",
    "Làm Đẹp - Sức Khỏe",
    "Nhà Sách Tiki",
    "Thời trang nam",
    "Bách Hóa Online",
    "Thiết Bị Số - Phụ Kiện Số",
    "Điện Tử - Điện Lạnh",
    "Laptop - Máy Vi Tính - Linh kiện",
    "Giày - Dép nam",
    "Ô Tô - Xe Máy - Xe Đạp",
    "Thời trang nữ",
    "Máy Ảnh - Máy Quay Phim",
    "Đồng hồ và Trang sức",
    "Chăm sóc nhà cửa",
    "Nhà Cửa - Đời Sống",
    "Túi thời trang nam",
    "Giày - Dép nữ",
    "Điện Gia Dụng",
    "NGON",
    "Túi thời trang nữ",
    "Voucher - Dịch vụ",
    "Cross Border - Hàng Quốc Tế",
    "Phụ kiện thời trang",
];

const INSTRUCTIONS: &str = r#"You are the router of a shopping assistant that searches with text. The user message contains:

- Past conversations
- User summary
- User query
- Use image to search: No

Task:
- Identify the user's intent from the query and past conversations (e.g. "Tìm kệ sách màu đen").
- Decide whether the answer is already in the past conversations or the user summary.
  - If it is, set needs_context to false, target to "already_known" and query to "".
  - If not, set needs_context to true and pick target "products" or "faq" from the intent.
- Write the search text into query.
- For product searches, build a filter from what the user asked for. Use only these fields:
    brand: string, when the user names a brand.
    rating_average: number from 0 to 5.
    price: number in VND.
    review_count: number of reviews.
    category_level_1: one of the categories listed below.
    sold_score: number, estimated daily sales.
  Each field is an object of operators: $eq, $ne, $gt, $gte, $lt, $lte, $in, $nin.
  Leave filter out for FAQ searches or when the user gives no constraints.

Categories: "#;

const EXAMPLE: &str = r#"

Example for "Tìm kệ sách màu đen tầm 1 triệu, đánh giá tốt":
{
  "needs_context": true,
  "intent": "Tìm kệ sách màu đen",
  "query": "kệ sách màu đen",
  "target": "products",
  "filter": {
    "category_level_1": {"$eq": "Nhà Cửa - Đời Sống"},
    "rating_average": {"$gte": 4.0},
    "price": {"$gte": 500000, "$lte": 2000000}
  }
}"#;

/// The router's system prompt.
pub fn router_instructions() -> String {
    let categories = CATEGORIES
        .iter()
        .map(|c| format!("'{c}'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{INSTRUCTIONS}{categories}{EXAMPLE}")
}

/// Renders recent exchanges, newest first, for prompts and context blocks.
pub fn render_history(history: &[HistoryPair]) -> String {
    if history.is_empty() {
        return NO_HISTORY.to_string();
    }
    let pairs: Vec<_> = history
        .iter()
        .map(|(query, response)| serde_json::json!({"query": query, "response": response}))
        .collect();
    serde_json::Value::Array(pairs).to_string()
}

/// The router's user message for one text turn.
pub fn router_message(query: &str, history: &[HistoryPair], summary: &UserSummary) -> String {
    format!(
        "Past conversations: {}\nUser summary: {}\nUser query: {query}\nUse image to search: No",
        render_history(history),
        summary.to_prompt_json(),
    )
}
