/*
 * Responsibility
 * - middleware の公開インターフェース
 *   - access: Access Decision Filter (route 毎の redirect/allow)
 *   - http / cors / security_headers: 横断的な transport の関心事
 */
pub mod access;
pub mod cors;
pub mod http;
pub mod security_headers;
