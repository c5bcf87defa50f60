// UI string tables.
// - Lookup order: active language, then English, then the key itself.
// - Placeholders use `{name}` and are filled by `t_with`.
pub const LANGUAGES: [(&str, &str); 3] = [
    ("en", "English"),
    ("id", "Bahasa Indonesia"),
    ("km", "ភាសាខ្មែរ"),
];

type Table = &'static [(&'static str, &'static str)];

const EN: Table = &[
    ("app_title", "TikTok Downloader"),
    ("tab_download", "Download"),
    ("tab_history", "History"),
    ("tab_settings", "Settings"),
    ("url_label", "URL"),
    ("convert_mp3", "Convert to MP3"),
    ("ready", "Ready"),
    ("downloading", "Downloading..."),
    ("profile_url_detected", "✅ Profile URL detected - Bulk download mode"),
    ("video_url_detected", "✅ Video URL detected - Single download mode"),
    ("valid_url_detected", "✅ Valid TikTok URL detected"),
    ("invalid_url_message", "❌ Invalid TikTok URL"),
    ("batch_file_detected", "📄 Link file path - press Ctrl+b to import"),
    ("empty_url_error", "Please enter a URL"),
    ("invalid_url_error", "Invalid TikTok URL"),
    ("already_running", "A download is already running"),
    ("download_success_message", "Downloaded: {title}"),
    ("download_failed_message", "Download failed: {error}"),
    ("profile_download_start", "Starting profile download..."),
    ("profile_progress_text", "Downloading {current}/{total}: {video}..."),
    ("profile_download_success", "Downloaded {done}/{total} videos"),
    ("batch_loaded", "Loaded {count} links ({profiles} profiles, {videos} videos)"),
    ("batch_import_details", "{duplicates} duplicates and {invalid} invalid lines ignored"),
    ("batch_summary", "Batch finished: {succeeded} ok, {failed} failed, {skipped} skipped"),
    ("batch_staged", "Press Enter to start the batch, edit the URL to discard it"),
    ("download_paused", "Download paused"),
    ("download_resumed", "Download resumed"),
    ("stopping_download", "Stopping download..."),
    ("download_stopped", "Stopped by user"),
    ("nothing_running", "No download is running"),
    ("detecting_profile", "🔄 Detecting profile..."),
    ("profile_info_all", "👤 @{username} - {count} videos available | Downloading ALL videos"),
    ("profile_info_limited", "👤 @{username} - {count} videos available | Downloading {limit} videos"),
    ("profile_info_failed", "⚠️ Unable to fetch profile info"),
    ("download_location", "Download Location"),
    ("language", "Language"),
    ("theme", "Theme"),
    ("video_quality", "Video Quality"),
    ("auto_update", "Auto-update yt-dlp on startup"),
    ("save_history", "Save download history"),
    ("profile_folders", "Create folders for profile downloads"),
    ("profile_limit", "Profile video limit (0 = all)"),
    ("ytdlp_path", "yt-dlp command"),
    ("ffmpeg_path", "ffmpeg command"),
    ("update_now", "Update yt-dlp Now"),
    ("updating", "Updating yt-dlp..."),
    ("update_failed", "Update failed: {error}"),
    ("ytdlp_version", "yt-dlp version"),
    ("not_installed", "not installed"),
    ("ffmpeg_missing", "⚠️ ffmpeg not found - MP3 conversion is unavailable"),
    ("update_available", "A newer yt-dlp is available - press Ctrl+u on the Settings tab"),
    ("settings_saved", "Settings saved successfully!"),
    ("settings_reset", "Settings reset to defaults"),
    ("settings_exported", "Settings exported to {path}"),
    ("settings_imported", "Settings imported from {path}"),
    ("path_required", "Download location cannot be empty"),
    ("download_history", "Download History"),
    ("no_history", "No download history yet."),
    ("history_cleared", "History cleared!"),
    ("history_deleted", "Removed from history"),
    ("filter_all", "All"),
    ("filter_video", "Video"),
    ("filter_mp3", "MP3"),
    ("filter_profile", "Profile"),
    ("search", "Search"),
    ("file_not_found", "File not found"),
    ("redownload_ready", "URL copied to the Download tab"),
];

const ID: Table = &[
    ("app_title", "Pengunduh TikTok"),
    ("tab_download", "Unduh"),
    ("tab_history", "Riwayat"),
    ("tab_settings", "Pengaturan"),
    ("convert_mp3", "Konversi ke MP3"),
    ("ready", "Siap"),
    ("downloading", "Mengunduh..."),
    ("profile_url_detected", "✅ URL Profil terdeteksi - Mode unduh massal"),
    ("video_url_detected", "✅ URL Video terdeteksi - Mode unduh tunggal"),
    ("valid_url_detected", "✅ URL TikTok valid terdeteksi"),
    ("invalid_url_message", "❌ URL TikTok tidak valid"),
    ("batch_file_detected", "📄 Berkas tautan - tekan Ctrl+b untuk mengimpor"),
    ("empty_url_error", "Silakan masukkan URL"),
    ("invalid_url_error", "URL TikTok tidak valid"),
    ("already_running", "Unduhan sedang berjalan"),
    ("download_success_message", "Diunduh: {title}"),
    ("download_failed_message", "Unduhan gagal: {error}"),
    ("profile_download_start", "Memulai unduhan profil..."),
    ("profile_progress_text", "Mengunduh {current}/{total}: {video}..."),
    ("profile_download_success", "Berhasil mengunduh {done}/{total} video"),
    ("batch_loaded", "{count} tautan dimuat ({profiles} profil, {videos} video)"),
    ("batch_summary", "Batch selesai: {succeeded} berhasil, {failed} gagal, {skipped} dilewati"),
    ("download_paused", "Unduhan dijeda"),
    ("download_resumed", "Unduhan dilanjutkan"),
    ("stopping_download", "Menghentikan unduhan..."),
    ("download_stopped", "Dihentikan oleh pengguna"),
    ("detecting_profile", "🔄 Mendeteksi profil..."),
    ("profile_info_all", "👤 @{username} - {count} video tersedia | Mengunduh SEMUA video"),
    ("profile_info_limited", "👤 @{username} - {count} video tersedia | Mengunduh {limit} video"),
    ("profile_info_failed", "⚠️ Tidak dapat mengambil info profil"),
    ("download_location", "Lokasi Unduhan"),
    ("language", "Bahasa"),
    ("theme", "Tema"),
    ("video_quality", "Kualitas Video"),
    ("auto_update", "Perbarui yt-dlp otomatis saat mulai"),
    ("save_history", "Simpan riwayat unduhan"),
    ("profile_folders", "Buat folder untuk unduhan profil"),
    ("profile_limit", "Batas video profil (0 = semua)"),
    ("update_now", "Perbarui yt-dlp Sekarang"),
    ("updating", "Memperbarui yt-dlp..."),
    ("update_failed", "Pembaruan gagal: {error}"),
    ("not_installed", "tidak terpasang"),
    ("settings_saved", "Pengaturan berhasil disimpan!"),
    ("settings_reset", "Pengaturan dikembalikan ke bawaan"),
    ("path_required", "Lokasi unduhan tidak boleh kosong"),
    ("download_history", "Riwayat Unduhan"),
    ("no_history", "Belum ada riwayat unduhan."),
    ("history_cleared", "Riwayat dibersihkan!"),
    ("history_deleted", "Dihapus dari riwayat"),
    ("filter_all", "Semua"),
    ("filter_profile", "Profil"),
    ("search", "Cari"),
    ("file_not_found", "Berkas tidak ditemukan"),
];

const KM: Table = &[
    ("app_title", "កម្មវិធីទាញយក TikTok"),
    ("tab_download", "ទាញយក"),
    ("tab_history", "ប្រវត្តិ"),
    ("tab_settings", "ការកំណត់"),
    ("convert_mp3", "បម្លែងទៅ MP3"),
    ("ready", "រួចរាល់"),
    ("downloading", "កំពុងទាញយក..."),
    ("profile_url_detected", "✅ រកឃើញតំណប្រវត្តិរូប - របៀបទាញយកច្រើន"),
    ("video_url_detected", "✅ រកឃើញតំណវីដេអូ - របៀបទាញយកតែមួយ"),
    ("valid_url_detected", "✅ រកឃើញតំណ TikTok ត្រឹមត្រូវ"),
    ("invalid_url_message", "❌ តំណ TikTok មិនត្រឹមត្រូវ"),
    ("empty_url_error", "សូមបញ្ចូលតំណ"),
    ("invalid_url_error", "តំណ TikTok មិនត្រឹមត្រូវ"),
    ("download_success_message", "បានទាញយក: {title}"),
    ("download_failed_message", "ការទាញយកបរាជ័យ: {error}"),
    ("profile_download_start", "កំពុងចាប់ផ្តើមទាញយកប្រវត្តិរូប..."),
    ("profile_progress_text", "កំពុងទាញយក {current}/{total}: {video}..."),
    ("profile_download_success", "បានទាញយក {done}/{total} វីដេអូ"),
    ("download_paused", "ការទាញយកត្រូវបានផ្អាក"),
    ("download_resumed", "ការទាញយកបានបន្ត"),
    ("stopping_download", "កំពុងបញ្ឈប់ការទាញយក..."),
    ("detecting_profile", "🔄 កំពុងរកប្រវត្តិរូប..."),
    ("profile_info_all", "👤 @{username} - មានវីដេអូ {count} | កំពុងទាញយកទាំងអស់"),
    ("profile_info_limited", "👤 @{username} - មានវីដេអូ {count} | កំពុងទាញយក {limit} វីដេអូ"),
    ("profile_info_failed", "⚠️ មិនអាចយកព័ត៌មានប្រវត្តិរូប"),
    ("download_location", "ទីតាំងទាញយក"),
    ("language", "ភាសា"),
    ("video_quality", "គុណភាពវីដេអូ"),
    ("auto_update", "ធ្វើបច្ចុប្បន្នភាព yt-dlp ដោយស្វ័យប្រវត្តិនៅពេលចាប់ផ្តើម"),
    ("save_history", "រក្សាទុកប្រវត្តិទាញយក"),
    ("profile_folders", "បង្កើតថតសម្រាប់ការទាញយកប្រវត្តិរូប"),
    ("update_now", "ធ្វើបច្ចុប្បន្នភាព yt-dlp ឥឡូវ"),
    ("settings_saved", "រក្សាទុកការកំណត់ជោគជ័យ!"),
    ("download_history", "ប្រវត្តិទាញយក"),
    ("no_history", "មិនទាន់មានប្រវត្តិទាញយកទេ។"),
    ("history_cleared", "បានសម្អាតប្រវត្តិ!"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translator {
    code: &'static str,
    table: Table,
}

impl Translator {
    /// Unknown codes fall back to English.
    pub fn new(code: &str) -> Self {
        let (code, table) = match code {
            "id" => ("id", ID),
            "km" => ("km", KM),
            _ => ("en", EN),
        };
        Self { code, table }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn t<'a>(&self, key: &'a str) -> &'a str {
        lookup(self.table, key)
            .or_else(|| lookup(EN, key))
            .unwrap_or(key)
    }

    pub fn t_with(&self, key: &str, values: &[(&str, &str)]) -> String {
        values
            .iter()
            .fold(self.t(key).to_string(), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }
}

fn lookup(table: Table, key: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, text)| *text)
}

/// Display name for a language code, or the code itself.
pub fn language_name(code: &str) -> &str {
    LANGUAGES
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

pub fn next_language(code: &str) -> &'static str {
    let index = LANGUAGES
        .iter()
        .position(|(candidate, _)| *candidate == code)
        .map(|index| (index + 1) % LANGUAGES.len())
        .unwrap_or(0);
    LANGUAGES[index].0
}

pub fn previous_language(code: &str) -> &'static str {
    let index = LANGUAGES
        .iter()
        .position(|(candidate, _)| *candidate == code)
        .map(|index| (index + LANGUAGES.len() - 1) % LANGUAGES.len())
        .unwrap_or(0);
    LANGUAGES[index].0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_table_wins() {
        assert_eq!(Translator::new("id").t("ready"), "Siap");
        assert_eq!(Translator::new("km").t("ready"), "រួចរាល់");
    }

    #[test]
    fn missing_keys_fall_back_to_english_then_key() {
        let km = Translator::new("km");
        assert_eq!(km.t("file_not_found"), "File not found");
        assert_eq!(km.t("no_such_key"), "no_such_key");
    }

    #[test]
    fn unknown_language_is_english() {
        let translator = Translator::new("fr");
        assert_eq!(translator.code(), "en");
        assert_eq!(translator.t("tab_history"), "History");
    }

    #[test]
    fn placeholders_are_filled() {
        let text = Translator::new("en").t_with(
            "profile_download_success",
            &[("done", "3"), ("total", "5")],
        );
        assert_eq!(text, "Downloaded 3/5 videos");
    }

    #[test]
    fn every_table_key_exists_in_english() {
        for (key, _) in ID.iter().chain(KM.iter()) {
            assert!(lookup(EN, key).is_some(), "{key} missing from English");
        }
    }

    #[test]
    fn language_cycle_wraps() {
        assert_eq!(next_language("km"), "en");
        assert_eq!(previous_language("en"), "km");
        assert_eq!(language_name("id"), "Bahasa Indonesia");
    }
}
