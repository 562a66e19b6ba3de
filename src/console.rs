//! コンソール設定

/// コンソール出力をUTF-8にする（中国語のファイル名・ログ表示のため）
///
/// Windows以外では何もしない。切り替えに失敗しても処理は続ける。
#[cfg(windows)]
pub fn init_utf8_console() {
    const CP_UTF8: u32 = 65001;
    // SAFETY: 引数は整数のコードページのみ
    unsafe {
        winapi::um::wincon::SetConsoleOutputCP(CP_UTF8);
        winapi::um::wincon::SetConsoleCP(CP_UTF8);
    }
}

#[cfg(not(windows))]
pub fn init_utf8_console() {}
