/// 规范化邮箱地址: 去空白并小写
///
/// 跨来源去重和内部收件人匹配都使用该规范化结果作为键。
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
