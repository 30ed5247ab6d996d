/*!
 * Session context extractor
 *
 * Responsibility:
 * - access filter が通したリクエストのセッション情報（SessionCtx）を handler に提供する
 * - HTTP / axum 依存は core に閉じ込め、型定義は types に分離する
 *
 * Public API:
 * - SessionCtx
 * - SessionCtxExtractor
 */

mod core;
mod types;

pub use self::core::SessionCtxExtractor;
pub use types::SessionCtx;
