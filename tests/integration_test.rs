use schwab_harvester::browser::connect_to_browser_and_page;
use schwab_harvester::config::Config;
use schwab_harvester::infrastructure::JsExecutor;
use schwab_harvester::services::navigator::CLIENT_AREA_MARKER;

#[tokio::test]
#[ignore] // 默认忽略，需要先启动带调试端口的浏览器：cargo test -- --ignored
async fn test_browser_connection() {
    // 加载配置
    let config = Config::from_env();

    // 测试浏览器连接
    let result = connect_to_browser_and_page(
        config.browser_debug_port,
        Some(&config.target_url),
        Some(CLIENT_AREA_MARKER),
    )
    .await;

    assert!(result.is_ok(), "应该能够成功连接浏览器");
}

#[tokio::test]
#[ignore]
async fn test_eval_on_connected_page() {
    let config = Config::from_env();
    let (_browser, page) = connect_to_browser_and_page(config.browser_debug_port, None, None)
        .await
        .expect("连接浏览器失败");

    let executor = JsExecutor::new(page);
    let sum: i64 = executor.eval_as("1 + 2").await.expect("执行 JS 失败");
    assert_eq!(sum, 3);
    assert!(!executor.exists("#definitely-not-here").await.unwrap());
}
