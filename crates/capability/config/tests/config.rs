use spraygw_config::AppConfig;

#[test]
fn load_config_from_env() {
    std::env::set_var("GW_HTTP_ADDR", "127.0.0.1:8081");
    std::env::set_var("GW_GATEWAY_LISTEN_PORT", "9001");
    std::env::set_var("GW_GATEWAY_INITIAL_TIMEOUT_MS", "5000");

    let config = AppConfig::from_env().expect("config");
    assert_eq!(config.http_addr, "127.0.0.1:8081");
    assert_eq!(config.gateway_listen_port, 9001);
    assert_eq!(config.gateway_initial_timeout_ms, 5000);
    // 未设置的键取默认值
    assert_eq!(config.gateway_reconnect_backoff_ms, 1000);
    assert!(!config.master_enabled);
}
