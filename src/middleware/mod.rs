/*
 * Responsibility
 * - middleware の公開インターフェース (re-export)
 * - pub fn apply(...) を module ごとに持たせる
 */
pub mod auth;
pub mod cors;
pub mod http;
