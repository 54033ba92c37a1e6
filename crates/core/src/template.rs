use std::collections::HashMap;

use crate::{CourierError, CourierResult};

/// 渲染 `{{variable}}` 占位符模板
///
/// 占位符名称两侧允许空白，例如 `{{ first_name }}`。
/// 未闭合的占位符或缺失的变量会返回 [`CourierError::Template`]，
/// 由调用方按行级错误处理，不中断整个批次。
pub fn render(template: &str, vars: &HashMap<String, String>) -> CourierResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| {
            CourierError::Template(format!("占位符未闭合: {}", &rest[start..]))
        })?;
        let key = after[..end].trim();
        if key.is_empty() {
            return Err(CourierError::Template("占位符名称为空".to_string()));
        }
        let value = vars
            .get(key)
            .ok_or_else(|| CourierError::Template(format!("缺少模板变量: {key}")))?;
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);

    Ok(out)
}
