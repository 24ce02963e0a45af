//! 取回策略 - 业务能力层
//!
//! 两种方式把一条记录变成磁盘上的文件：
//! - `DirectDownload`：直接下载链接指向的文件，原样保存
//! - `RenderAndCapture`：打开详情 → 找打印控件 → 渲染成单页 PDF → 关闭详情
//!
//! 调用前由流程层检查目标文件是否存在，存在时策略不会被调用。

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use phf::phf_map;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{HarvestError, Result};
use crate::infrastructure::{ArtifactStore, Pacer};
use crate::models::{DetailKind, RetrievalHandle};

/// 一次取回请求，句柄在请求结束后失效
#[derive(Debug)]
pub struct RetrievalRequest {
    pub handle: RetrievalHandle,
    pub detail: DetailKind,
    pub target: PathBuf,
}

/// 取回策略
#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// 取回并写入 `request.target`，返回写入的字节数
    async fn fetch(&self, request: RetrievalRequest, store: &ArtifactStore) -> Result<u64>;
}

// ========== 直接下载 ==========

/// 下载能力：根据句柄拿到文件字节
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, handle: &RetrievalHandle) -> Result<Vec<u8>>;
}

/// 直接下载，不重试
pub struct DirectDownload<D> {
    downloader: D,
}

impl<D: Downloader> DirectDownload<D> {
    pub fn new(downloader: D) -> Self {
        Self { downloader }
    }
}

#[async_trait]
impl<D: Downloader> RetrievalStrategy for DirectDownload<D> {
    fn name(&self) -> &'static str {
        "direct-download"
    }

    async fn fetch(&self, request: RetrievalRequest, store: &ArtifactStore) -> Result<u64> {
        let RetrievalRequest { handle, target, .. } = request;

        let bytes = self
            .downloader
            .download(&handle)
            .await
            .map_err(|e| match e {
                HarvestError::TransientUi { .. } => e,
                other => HarvestError::transient("download", other.to_string()),
            })?;

        if bytes.is_empty() {
            return Err(HarvestError::transient(
                "download",
                format!("下载内容为空: {}", target.display()),
            ));
        }

        store.write(&target, &bytes)
    }
}

// ========== 渲染并截取 ==========

/// 各类详情的打印控件选择器，按顺序尝试，第一个匹配的生效
static CAPTURE_CONTROLS: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "trade" => &["a#customModalPrint", "a.linkPrint", "button[aria-label='Print']"],
    "wire" => &["a#customModalPrint", "a.linkPrint"],
    "check" => &["a.linkPrint", "a#customModalPrint"],
    "statement" => &["a#customModalPrint", "button[aria-label='Print']"],
};

/// 详情子类型对应的打印控件链
pub fn capture_controls(detail: DetailKind) -> &'static [&'static str] {
    CAPTURE_CONTROLS
        .get(detail.as_str())
        .copied()
        .unwrap_or(&[])
}

/// 单页 PDF 版式（英寸）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintLayout {
    pub paper_width: f64,
    pub paper_height: f64,
    pub margin: f64,
}

impl PrintLayout {
    /// Letter 纸，0.4 英寸边距
    pub const LETTER: PrintLayout = PrintLayout {
        paper_width: 8.5,
        paper_height: 11.0,
        margin: 0.4,
    };

    pub fn to_params(&self) -> PrintToPdfParams {
        PrintToPdfParams {
            paper_width: Some(self.paper_width),
            paper_height: Some(self.paper_height),
            margin_top: Some(self.margin),
            margin_bottom: Some(self.margin),
            margin_left: Some(self.margin),
            margin_right: Some(self.margin),
            print_background: Some(true),
            page_ranges: Some("1".to_string()),
            ..Default::default()
        }
    }
}

impl Default for PrintLayout {
    fn default() -> Self {
        Self::LETTER
    }
}

/// 可以打开详情并渲染的页面表面
#[async_trait]
pub trait CaptureSurface: Send + Sync {
    /// 通过句柄打开详情视图
    async fn open_detail(&self, handle: &RetrievalHandle) -> Result<()>;

    /// 在限定时间内查找控件
    async fn locate_control(&self, selector: &str) -> Result<bool>;

    /// 触发打印控件
    async fn trigger_control(&self, selector: &str) -> Result<()>;

    /// 渲染当前视图，可能返回多页，只保留第一页
    async fn render(&self, layout: &PrintLayout) -> Result<Vec<Vec<u8>>>;

    /// 关闭详情视图
    async fn close_detail(&self) -> Result<()>;
}

/// 渲染流程的状态
enum CaptureState {
    Opened,
    ControlLocated(&'static str),
    Captured(Vec<u8>),
}

impl CaptureState {
    fn name(&self) -> &'static str {
        match self {
            CaptureState::Opened => "Opened",
            CaptureState::ControlLocated(_) => "ControlLocated",
            CaptureState::Captured(_) => "Captured",
        }
    }
}

/// 渲染并截取
pub struct RenderAndCapture<S> {
    surface: S,
    pacer: Arc<dyn Pacer>,
    layout: PrintLayout,
}

impl<S: CaptureSurface> RenderAndCapture<S> {
    pub fn new(surface: S, pacer: Arc<dyn Pacer>) -> Self {
        Self {
            surface,
            pacer,
            layout: PrintLayout::default(),
        }
    }

    /// Opened → ControlLocated → Captured
    async fn capture(&self, detail: DetailKind, target: &Path) -> Result<Vec<u8>> {
        let mut state = CaptureState::Opened;
        loop {
            debug!("渲染状态: {} ({})", state.name(), target.display());
            state = match state {
                CaptureState::Opened => match self.locate_control(detail).await? {
                    Some(selector) => CaptureState::ControlLocated(selector),
                    None => {
                        return Err(HarvestError::attention(
                            target,
                            format!(
                                "{} 详情中没有找到打印控件 (已尝试: {:?})",
                                detail.as_str(),
                                capture_controls(detail)
                            ),
                        ))
                    }
                },
                CaptureState::ControlLocated(selector) => {
                    self.surface.trigger_control(selector).await?;
                    self.pacer.pause().await;

                    let pages = self.surface.render(&self.layout).await?;
                    if pages.len() > 1 {
                        debug!("丢弃 {} 个附加页面", pages.len() - 1);
                    }
                    match pages.into_iter().next() {
                        Some(bytes) if !bytes.is_empty() => CaptureState::Captured(bytes),
                        _ => {
                            return Err(HarvestError::attention(
                                target,
                                "触发打印后没有生成文件",
                            ))
                        }
                    }
                }
                CaptureState::Captured(bytes) => return Ok(bytes),
            };
        }
    }

    /// 依次尝试控件链，第一个找到的生效
    async fn locate_control(&self, detail: DetailKind) -> Result<Option<&'static str>> {
        for &selector in capture_controls(detail) {
            match self.surface.locate_control(selector).await {
                Ok(true) => return Ok(Some(selector)),
                Ok(false) => debug!("未找到控件 {}，尝试下一个", selector),
                Err(e @ HarvestError::TransientUi { .. }) => {
                    debug!("查找控件 {} 失败: {}，尝试下一个", selector, e)
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl<S: CaptureSurface> RetrievalStrategy for RenderAndCapture<S> {
    fn name(&self) -> &'static str {
        "render-and-capture"
    }

    async fn fetch(&self, request: RetrievalRequest, store: &ArtifactStore) -> Result<u64> {
        let RetrievalRequest {
            handle,
            detail,
            target,
        } = request;

        self.surface.open_detail(&handle).await?;
        drop(handle);
        self.pacer.pause().await;

        let captured = self.capture(detail, &target).await;

        // 不论成功与否都要关闭详情，再把控制交回翻页循环
        let closed = self.surface.close_detail().await;
        self.pacer.pause().await;
        debug!("渲染状态: Closed ({})", target.display());

        match (captured, closed) {
            (Ok(bytes), close_result) => {
                // 截到的内容先落盘，再报告关闭失败
                let written = store.write(&target, &bytes)?;
                info!("✓ 已保存: {}", target.display());
                close_result.map(|()| written)
            }
            (Err(e), close_result) => {
                if let Err(close_err) = close_result {
                    warn!("关闭详情失败: {}", close_err);
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::NoopPacer;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// 记录调用顺序的假页面
    struct FakeSurface {
        present: Vec<&'static str>,
        pages: Vec<Vec<u8>>,
        close_fails: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSurface {
        fn new(present: &[&'static str], pages: Vec<Vec<u8>>) -> Self {
            Self {
                present: present.to_vec(),
                pages,
                close_fails: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CaptureSurface for FakeSurface {
        async fn open_detail(&self, handle: &RetrievalHandle) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("open:{}", handle.row_index));
            Ok(())
        }

        async fn locate_control(&self, selector: &str) -> Result<bool> {
            self.calls.lock().unwrap().push(format!("locate:{}", selector));
            Ok(self.present.contains(&selector))
        }

        async fn trigger_control(&self, selector: &str) -> Result<()> {
            self.calls.lock().unwrap().push(format!("trigger:{}", selector));
            Ok(())
        }

        async fn render(&self, _layout: &PrintLayout) -> Result<Vec<Vec<u8>>> {
            self.calls.lock().unwrap().push("render".to_string());
            Ok(self.pages.clone())
        }

        async fn close_detail(&self) -> Result<()> {
            self.calls.lock().unwrap().push("close".to_string());
            if self.close_fails {
                return Err(HarvestError::transient("close-detail", "详情弹窗没有关闭"));
            }
            Ok(())
        }
    }

    fn request(dir: &TempDir, detail: DetailKind) -> RetrievalRequest {
        RetrievalRequest {
            handle: RetrievalHandle {
                page_index: 0,
                row_index: 3,
                href: None,
            },
            detail,
            target: dir.path().join("artifact.pdf"),
        }
    }

    #[tokio::test]
    async fn test_secondary_control_is_used_without_escalation() {
        let dir = TempDir::new().unwrap();
        let surface = FakeSurface::new(&["a.linkPrint"], vec![b"page-1".to_vec(), b"page-2".to_vec()]);
        let strategy = RenderAndCapture::new(surface, Arc::new(NoopPacer));

        let written = strategy
            .fetch(request(&dir, DetailKind::Wire), &ArtifactStore::new())
            .await
            .unwrap();

        assert_eq!(written, 6);
        assert_eq!(std::fs::read(dir.path().join("artifact.pdf")).unwrap(), b"page-1");
        assert_eq!(
            strategy.surface.calls(),
            vec![
                "open:3",
                "locate:a#customModalPrint",
                "locate:a.linkPrint",
                "trigger:a.linkPrint",
                "render",
                "close",
            ]
        );
    }

    #[tokio::test]
    async fn test_no_control_escalates_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let surface = FakeSurface::new(&[], vec![b"never".to_vec()]);
        let strategy = RenderAndCapture::new(surface, Arc::new(NoopPacer));

        let err = strategy
            .fetch(request(&dir, DetailKind::Check), &ArtifactStore::new())
            .await
            .unwrap_err();

        assert!(matches!(err, HarvestError::NeedsOperatorAttention { .. }));
        assert!(!dir.path().join("artifact.pdf").exists());
        let calls = strategy.surface.calls();
        assert_eq!(calls.last().map(String::as_str), Some("close"));
        assert!(!calls.iter().any(|c| c == "render"));
    }

    #[tokio::test]
    async fn test_capture_is_saved_when_close_fails() {
        let dir = TempDir::new().unwrap();
        let mut surface = FakeSurface::new(&["a#customModalPrint"], vec![b"page-1".to_vec()]);
        surface.close_fails = true;
        let strategy = RenderAndCapture::new(surface, Arc::new(NoopPacer));

        let err = strategy
            .fetch(request(&dir, DetailKind::Trade), &ArtifactStore::new())
            .await
            .unwrap_err();

        assert!(matches!(err, HarvestError::TransientUi { .. }));
        assert_eq!(std::fs::read(dir.path().join("artifact.pdf")).unwrap(), b"page-1");
    }

    #[tokio::test]
    async fn test_empty_render_escalates() {
        let dir = TempDir::new().unwrap();
        let surface = FakeSurface::new(&["a#customModalPrint"], vec![]);
        let strategy = RenderAndCapture::new(surface, Arc::new(NoopPacer));

        let err = strategy
            .fetch(request(&dir, DetailKind::Trade), &ArtifactStore::new())
            .await
            .unwrap_err();

        assert!(matches!(err, HarvestError::NeedsOperatorAttention { .. }));
        assert!(!dir.path().join("artifact.pdf").exists());
    }

    struct FakeDownloader {
        result: std::result::Result<Vec<u8>, &'static str>,
    }

    #[async_trait]
    impl Downloader for FakeDownloader {
        async fn download(&self, _handle: &RetrievalHandle) -> Result<Vec<u8>> {
            self.result
                .clone()
                .map_err(|msg| HarvestError::Config(msg.to_string()))
        }
    }

    #[tokio::test]
    async fn test_direct_download_writes_bytes_verbatim() {
        let dir = TempDir::new().unwrap();
        let strategy = DirectDownload::new(FakeDownloader {
            result: Ok(b"%PDF-1.7 statement".to_vec()),
        });

        strategy
            .fetch(request(&dir, DetailKind::Statement), &ArtifactStore::new())
            .await
            .unwrap();

        assert_eq!(
            std::fs::read(dir.path().join("artifact.pdf")).unwrap(),
            b"%PDF-1.7 statement"
        );
    }

    #[tokio::test]
    async fn test_direct_download_failure_is_transient() {
        let dir = TempDir::new().unwrap();
        let strategy = DirectDownload::new(FakeDownloader {
            result: Err("connection reset"),
        });

        let err = strategy
            .fetch(request(&dir, DetailKind::Statement), &ArtifactStore::new())
            .await
            .unwrap_err();

        assert!(matches!(err, HarvestError::TransientUi { .. }));
        assert!(!dir.path().join("artifact.pdf").exists());
    }

    #[test]
    fn test_check_chain_prefers_check_control() {
        assert_eq!(capture_controls(DetailKind::Check)[0], "a.linkPrint");
        assert_eq!(capture_controls(DetailKind::Trade)[0], "a#customModalPrint");
    }
}
