//! 题目提取 - 业务能力层
//!
//! 在页面中查找"看起来像题目"的容器，判定题型，并提取题干与选项

use anyhow::Result;
use tracing::{debug, info, warn};

use super::label_resolver;
use crate::infrastructure::{ElementRef, PageQuery};
use crate::models::selector::patterns;
use crate::models::{ControlRef, Modality, Question, QuestionOption, Selector};

/// 题型判定时检查的控件
#[derive(Debug, Clone, Copy)]
enum Probe {
    Radio,
    Checkbox,
    Textarea,
    TextInput,
}

impl Probe {
    fn selector(self) -> Selector {
        match self {
            Probe::Radio => patterns::radio_input(),
            Probe::Checkbox => patterns::checkbox_input(),
            Probe::Textarea => patterns::textarea(),
            Probe::TextInput => patterns::text_input(),
        }
    }
}

/// 题型优先级：自上而下，第一个命中的控件决定题型
///
/// 文本输入框排在单选 / 多选之后，因此只有在没有选项控件时才会判为简答
const PRECEDENCE: [(Probe, Modality); 4] = [
    (Probe::Radio, Modality::MultipleChoice),
    (Probe::Checkbox, Modality::MultipleSelect),
    (Probe::Textarea, Modality::Essay),
    (Probe::TextInput, Modality::ShortAnswer),
];

/// 提取页面上的全部题目
///
/// 单个容器提取失败只会跳过该容器；没有容器时返回空列表
pub async fn extract(page: &dyn PageQuery) -> Vec<Question> {
    let containers = match page.find_all(&patterns::question_container()).await {
        Ok(containers) => containers,
        Err(e) => {
            warn!("查找题目容器失败: {}", e);
            return Vec::new();
        }
    };
    debug!("找到 {} 个候选题目容器", containers.len());

    let mut questions = Vec::new();
    for (position, container) in containers.iter().enumerate() {
        match extract_one(page, container.as_ref(), questions.len()).await {
            Ok(Some(question)) => questions.push(question),
            Ok(None) => debug!("容器 #{} 没有题干，跳过", position),
            Err(e) => warn!("容器 #{} 提取失败，跳过: {}", position, e),
        }
    }

    info!("📋 共提取 {} 道题目", questions.len());
    questions
}

async fn extract_one(page: &dyn PageQuery, container: &dyn ElementRef, index: usize) -> Result<Option<Question>> {
    let Some(text_element) = container.find_one(&patterns::question_text()).await? else {
        return Ok(None);
    };
    let text = text_element.text().await?.trim().to_string();
    if text.is_empty() {
        return Ok(None);
    }

    let (modality, controls) = classify(container).await?;

    let mut question = Question {
        index,
        text,
        modality,
        options: Vec::new(),
        input: None,
    };

    if modality.is_choice() {
        for control in &controls {
            question.options.push(build_option(page, control.as_ref()).await?);
        }
    } else if modality.is_text() {
        if let Some(control) = controls.first() {
            question.input = control_ref(control.as_ref(), false).await?;
        }
    }

    Ok(Some(question))
}

/// 按优先级表判定题型，同时返回命中的控件（文档顺序）
async fn classify(container: &dyn ElementRef) -> Result<(Modality, Vec<Box<dyn ElementRef>>)> {
    for (probe, modality) in PRECEDENCE {
        let controls = container.find_all(&probe.selector()).await?;
        if !controls.is_empty() {
            return Ok((modality, controls));
        }
    }
    Ok((Modality::Unknown, Vec::new()))
}

async fn build_option(page: &dyn PageQuery, control: &dyn ElementRef) -> Result<QuestionOption> {
    let text = label_resolver::resolve(page, control).await;
    let value = control.attribute("value").await?.unwrap_or_default();
    Ok(QuestionOption {
        text,
        control: control_ref(control, true).await?,
        value,
    })
}

async fn control_ref(control: &dyn ElementRef, with_value: bool) -> Result<Option<ControlRef>> {
    let id = control.attribute("id").await?;
    let name = control.attribute("name").await?;
    let value = if with_value {
        control.attribute("value").await?
    } else {
        None
    };
    Ok(ControlRef::from_attributes(id, name, value.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{choice_question, text_question, FakeDom};

    #[tokio::test]
    async fn test_extracts_choice_question_with_labels() {
        let dom = FakeDom::new();
        choice_question(&dom, "question_1", "Capital of France?", "radio", &["Paris", "London", "Berlin"]);

        let questions = extract(&dom).await;
        assert_eq!(questions.len(), 1);
        let q = &questions[0];
        assert_eq!(q.index, 0);
        assert_eq!(q.text, "Capital of France?");
        assert_eq!(q.modality, Modality::MultipleChoice);
        let labels: Vec<_> = q.options.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(labels, ["Paris", "London", "Berlin"]);
        assert_eq!(q.options[1].value, "1");
        assert_eq!(
            q.options[1].control,
            Some(ControlRef::Id("question_1_answer_1".into()))
        );
        assert!(q.input.is_none());
    }

    #[tokio::test]
    async fn test_modality_precedence() {
        let dom = FakeDom::new();
        choice_question(&dom, "q_ms", "Pick primes", "checkbox", &["2", "4", "5"]);
        text_question(&dom, "q_essay", "Explain ownership", true);
        text_question(&dom, "q_short", "Name a planet", false);

        // 同时有单选和文本框：单选优先
        let (mixed, _) = choice_question(&dom, "q_mixed", "Mixed", "radio", &["x", "y"]);
        dom.add(mixed, "input", &[("type", "text"), ("id", "other")], "");

        let unknown = dom.add(FakeDom::ROOT, "div", &[("class", "question")], "");
        dom.add(unknown, "div", &[("class", "question_text")], "No controls here");

        let questions = extract(&dom).await;
        let modalities: Vec<_> = questions.iter().map(|q| q.modality).collect();
        assert_eq!(
            modalities,
            [
                Modality::MultipleSelect,
                Modality::Essay,
                Modality::ShortAnswer,
                Modality::MultipleChoice,
                Modality::Unknown,
            ]
        );
        for q in &questions {
            assert_eq!(!q.options.is_empty(), q.modality.is_choice(), "question {}", q.index);
        }
        assert_eq!(questions[1].input, Some(ControlRef::Id("q_essay_input".into())));
    }

    #[tokio::test]
    async fn test_indices_are_dense_over_kept_questions() {
        let dom = FakeDom::new();
        text_question(&dom, "q1", "First", false);
        let empty = dom.add(FakeDom::ROOT, "div", &[("class", "question")], "");
        dom.add(empty, "div", &[("class", "question_text")], "   ");
        dom.add(FakeDom::ROOT, "div", &[("class", "quiz_question")], "no text element");
        text_question(&dom, "q2", "Second", false);

        let questions = extract(&dom).await;
        let summary: Vec<_> = questions.iter().map(|q| (q.index, q.text.as_str())).collect();
        assert_eq!(summary, [(0, "First"), (1, "Second")]);
    }

    #[tokio::test]
    async fn test_no_containers_returns_empty() {
        let dom = FakeDom::new();
        dom.add(FakeDom::ROOT, "p", &[], "Welcome");
        assert!(extract(&dom).await.is_empty());
    }

    #[tokio::test]
    async fn test_query_failure_returns_empty() {
        let dom = FakeDom::new();
        text_question(&dom, "q1", "First", false);
        dom.fail_queries();
        assert!(extract(&dom).await.is_empty());
    }

    #[tokio::test]
    async fn test_extraction_is_idempotent() {
        let dom = FakeDom::new();
        choice_question(&dom, "q1", "One", "radio", &["a", "b"]);
        text_question(&dom, "q2", "Two", true);

        let first = extract(&dom).await;
        let second = extract(&dom).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_option_without_id_uses_name_and_value() {
        let dom = FakeDom::new();
        let container = dom.add(FakeDom::ROOT, "div", &[("class", "question")], "");
        dom.add(container, "div", &[("class", "text")], "Pick one");
        let label = dom.add(container, "label", &[], "Yes");
        dom.add(label, "input", &[("type", "radio"), ("name", "q9"), ("value", "yes")], "");

        let questions = extract(&dom).await;
        assert_eq!(questions[0].options[0].text, "Yes");
        assert_eq!(
            questions[0].options[0].control,
            Some(ControlRef::NameValue {
                name: "q9".into(),
                value: "yes".into()
            })
        );
    }
}
