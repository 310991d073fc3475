//! 答案写入 - 业务能力层
//!
//! 把解析后的答案落到页面控件上。页面操作失败只返回 false，不向上传播

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use crate::infrastructure::PageQuery;
use crate::models::{option_letter, ControlRef, Modality, ParsedAnswer, Question, QuestionOption};

/// 写入答案，至少完成一次写入时返回 true
pub async fn apply(page: &dyn PageQuery, question: &Question, parsed: &ParsedAnswer) -> bool {
    match (question.modality, parsed) {
        (Modality::MultipleChoice, ParsedAnswer::Single(idx)) => match question.options.get(*idx) {
            Some(option) => activate(page, *idx, option).await,
            None => false,
        },
        (Modality::MultipleSelect, ParsedAnswer::Multiple(indices)) => {
            // 第一阶段：只保留存在的选项
            let targets: Vec<(usize, &QuestionOption)> = indices
                .iter()
                .filter_map(|idx| question.options.get(*idx).map(|o| (*idx, o)))
                .collect();
            if targets.len() < indices.len() {
                debug!("忽略 {} 个无效选项", indices.len() - targets.len());
            }

            // 第二阶段：逐个点击，单个失败不影响其余选项
            let mut applied = false;
            for (idx, option) in targets {
                applied |= activate(page, idx, option).await;
            }
            applied
        }
        (Modality::Essay | Modality::ShortAnswer, ParsedAnswer::Text(text)) => {
            let Some(input) = &question.input else {
                warn!("题目 #{} 没有可写入的输入框", question.index);
                return false;
            };
            match write_text(page, input, text).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("写入文本答案失败: {}", e);
                    false
                }
            }
        }
        _ => false,
    }
}

async fn activate(page: &dyn PageQuery, idx: usize, option: &QuestionOption) -> bool {
    let Some(control) = &option.control else {
        warn!("选项 {} 没有可定位的控件", option_letter(idx));
        return false;
    };
    match click(page, control).await {
        Ok(()) => {
            debug!("已选择选项 {}: {}", option_letter(idx), option.text);
            true
        }
        Err(e) => {
            warn!("点击选项 {} 失败: {}", option_letter(idx), e);
            false
        }
    }
}

async fn click(page: &dyn PageQuery, control: &ControlRef) -> Result<()> {
    let element = page
        .find_one(&control.selector())
        .await?
        .ok_or_else(|| anyhow!("未找到控件 {:?}", control))?;
    element.click().await
}

async fn write_text(page: &dyn PageQuery, control: &ControlRef, text: &str) -> Result<()> {
    let element = page
        .find_one(&control.selector())
        .await?
        .ok_or_else(|| anyhow!("未找到输入框 {:?}", control))?;
    element.clear().await?;
    element.type_text(text).await
}
