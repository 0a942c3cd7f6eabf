/*!
 * Security context extractor
 *
 * Responsibility:
 * - middleware が extensions に入れた SecurityContext を handler に渡す
 * - HTTP / axum 依存はここに閉じ込め、context 自体は services 側の型を使う
 */

mod security_ctx;

pub use security_ctx::SecurityCtx;
