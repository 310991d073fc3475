//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责会话生命周期和作答调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `session_manager` - 会话注册表
//! - 按会话 ID 管理全部会话（插入 / 查找 / 删除）
//! - 对外暴露 start / navigate / extract / solve / close / restore
//!
//! ### `session` - 单个会话
//! - 独占浏览器驱动句柄
//! - 维护状态机，拒绝未就绪状态下的操作
//! - 关闭时先保存 Cookie 再释放驱动
//!
//! ### `quiz_solver` - 测验作答器
//! - 等待并提取题目（Vec<Question>）
//! - 按顺序逐题调用 QuestionFlow
//! - 可选自动提交，输出 SolveReport
//!
//! ## 层次关系
//!
//! ```text
//! session_manager (处理 HashMap<id, Session>)
//!     ↓
//! session (持有 PageDriver)
//!     ↓
//! quiz_solver (处理 Vec<Question>)
//!     ↓
//! workflow::QuestionFlow (处理单个 Question)
//!     ↓
//! services (能力层：extract / prompt / llm / parse / apply / cookie)
//!     ↓
//! infrastructure (基础设施：PageDriver)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有会话持有驱动句柄，下层只借用 `PageQuery`
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **错误收敛**：单题失败变成 outcome 记录，只有会话状态错误会返回给调用方

pub mod quiz_solver;
pub mod session;
pub mod session_manager;

// 重新导出主要类型
pub use quiz_solver::{solve_quiz, wait_and_extract, SolveOptions};
pub use session::{Session, SessionState};
pub use session_manager::SessionManager;
