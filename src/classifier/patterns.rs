//! Pattern tables for the risk classifier.
//!
//! Each tier bucket and override bucket is compiled once, lazily, at first
//! use. Shapes and ordering mirror the source system this crate's risk model
//! was distilled from: five tier buckets plus four override buckets that
//! dominate them.

use crate::models::{ClassifierRule, RiskTier};
use once_cell::sync::Lazy;
use regex::Regex;

fn rule(pattern: &str, tier: RiskTier, reason: &'static str) -> ClassifierRule {
    rule_excluding(pattern, tier, reason, &[])
}

/// Like [`rule`], but the match is rejected if any of `excludes` appears
/// anywhere in the command — used where the source pattern relied on a
/// negative lookahead the regex engine here can't compile.
fn rule_excluding(pattern: &str, tier: RiskTier, reason: &'static str, excludes: &'static [&'static str]) -> ClassifierRule {
    ClassifierRule {
        pattern: Regex::new(pattern).unwrap_or_else(|e| panic!("bad pattern {pattern:?}: {e}")),
        tier,
        reason,
        excludes,
    }
}

/// Tier buckets, checked from CRITICAL down to SAFE when no override fires.
pub static TIER_RULES: Lazy<Vec<ClassifierRule>> = Lazy::new(|| {
    let mut rules = Vec::new();

    // CRITICAL — system-wide destructive operations.
    for (pattern, reason) in [
        (r"^rm\s+.*((-r|-rf|-rF|-fr|-Fr|-R|--recursive)\s+(/(\s|$)|/boot\b|/etc\b|/bin\b|/sbin\b|/lib\b|/usr\b|/var\b)|--)", "System directory removal"),
        (r"^rmdir\s+.*(/boot|/etc|/bin|/sbin|/lib|/usr|/var)\b", "System directory removal"),
        (r"^(mkfs|fdisk|dd|shred|wipefs)\b", "Disk formatting/partitioning/wiping"),
        (r"^mkfs\.[a-z0-9]+\s+(/dev/sd|/dev/nvme|/dev/xvd|/dev/vd|/dev/mapper)", "Filesystem creation on disk device"),
        (r"^(sgdisk|gdisk|parted|gparted)\s+.*(--zap|--clear|-c|-z|-o|mkpart|rm)", "Partition table modification"),
        (r"^dd\s+.*if=/dev/(zero|random|urandom).*of=/dev/(sd|hd|nvme|md|xvd|vd|mapper)", "Direct device writing"),
        (r"^(shutdown|poweroff|reboot|halt|init\s+(0|6))\b", "System power control"),
        (r"^ip\s+link\s+set\s+dev\s+(eth0|ens|wlan|bond|wlp|enp)\S*\s+down", "Network interface disabling"),
        (r"^(iptables|ufw)\s+.*(?:\s|^)(-F|--flush|-P\s+INPUT\s+DROP|-P\s+FORWARD\s+DROP)", "Firewall flushing/blocking"),
        (r"^passwd\s+root", "Root password change"),
        (r"^usermod\s+.*(-G\s+.*|--groups\s+.*)sudo.*root", "Changing root/sudo access"),
        (r"^(grub-install|efibootmgr\s+.*-c)\b", "Bootloader modification"),
    ] {
        rules.push(rule(pattern, RiskTier::Critical, reason));
    }

    // HIGH — significant but non-system-wide changes.
    for (pattern, reason) in [
        (r"^rm\s+.*(-r|-rf|-R|--recursive)\b", "Recursive file deletion"),
        (r"^rm\s+.*(-f|--force)\b", "Forced file deletion"),
        (r"^mv\s+.*(-f|--force)\b", "Forced file movement"),
        (r"^(apt|apt-get|yum|dnf|pacman|zypper|brew)\s+(install|remove|purge|autoremove)", "Package installation/removal"),
        (r"^pip\s+(install|uninstall)", "Python package installation/removal"),
        (r"^npm\s+(install|uninstall)\s+(-g|--global)", "Global NPM package installation/removal"),
        (r"^(useradd|userdel|groupadd|groupdel|usermod|groupmod)\b", "User/group management"),
        (r"^su\s+(?:[^-]|$)", "User switching"),
        (r"^sudo\s+.*\bbash\b", "Command execution as root"),
        (r"^(ifconfig|ip)\s+.*(?:netmask|broadcast|add|del|up|down)\b", "Network interface configuration"),
        (r"^route\s+(add|del)", "Routing table modification"),
        (r"^systemctl\s+(enable|disable|start|stop|restart|mask)\b", "System service management"),
        (r"^service\s+\S+\s+(start|stop|restart)\b", "Service control"),
        (r"^chmod\s+.*(/boot|/etc|/bin|/sbin|/lib|/usr|/var)", "Changing permissions in system directories"),
        (r"^chown\s+.*(/boot|/etc|/bin|/sbin|/lib|/usr|/var)", "Changing ownership in system directories"),
        (r"^chmod\s+.*(777|a\+[rwx]{3})\b", "Setting world-writable permissions"),
        (r"^chmod\s+.*(-R|--recursive)\b", "Recursive permission changes"),
        (r"^chown\s+.*(-R|--recursive)\b", "Recursive ownership changes"),
        (r"^mount\s+(/dev/|[^/ ]+:/)", "Mounting filesystems"),
        (r"^umount\s+(/|/home|/mnt|/media)", "Unmounting filesystems"),
        (r"^history\s+(-c|--clear)", "Clearing shell history"),
        (r"^(fdisk|gdisk|parted|partprobe)\b", "Partition management"),
        (r"^(ufw|firewall-cmd|iptables)\b", "Firewall configuration"),
        (r#"^(mysql|psql|mongo)\s+.*(-e\s+"DROP|"DELETE FROM)"#, "Database data deletion"),
        (r"^(nmap|nikto|sqlmap|aircrack-ng|metasploit)\b", "Network scanning/penetration testing"),
    ] {
        rules.push(rule(pattern, RiskTier::High, reason));
    }

    // MEDIUM — file modifications and information gathering with side effects.
    for (pattern, reason) in [
        (r"(>|>>)\s*[\w\./-]+", "Writing to files"),
        (r"^(nano|vim|vi|emacs|sed|truncate)\s+[\w\./-]+", "File editing"),
        (r"^ln\s+(-s|--symbolic)\s+", "Creating symbolic links"),
        (r"^(scp|rsync|sftp)\s+", "File transfer"),
        (r"^ssh\s+-R", "SSH reverse tunneling"),
        (r"^nc\s+(-l|--listen)", "NetCat listening"),
        (r"^curl\s+.*--output", "Downloading files"),
        (r"^wget\s+", "Downloading files"),
        (r"^du\s+.*(-a|-h|--all)", "Disk usage scanning"),
        (r"^kill\s+", "Process termination"),
        (r"^(pkill|killall)\s+", "Process termination by name"),
        (r"^(zip|tar|gzip|bzip2|xz)\s+.*(-d|--decompress|-x|--extract)", "Archive extraction"),
        (r"^(zip|tar|gzip|bzip2|xz)\s+.*(-c|--create)", "Archive creation"),
        (r"^(strace|ltrace|ptrace)\b", "Process tracing"),
        (r"^tcpdump\b", "Network packet capture"),
        (r"^docker\s+(run|exec|build|rm|stop)", "Docker container operations"),
        (r"^(mysql|psql|mongo|sqlite3)\b", "Database operations"),
        (r"^(apache2|nginx|httpd)\b", "Web server control"),
        (r"^(who|w|last|lastlog)\b", "User login information"),
        (r"^(dirb|dirbuster|enum4linux|gobuster|wpscan|dnsrecon)\b", "Information gathering tools"),
        (r"^(update-alternatives|alternatives)\s+--set", "System alternative configuration"),
        (r"\bsh\s+[^|;]+\.sh\b", "Shell script execution"),
        (r"\bbash\s+[^|;]+\.sh\b", "Bash script execution"),
        (r"^shred\s+", "Secure file deletion"),
        (r"^(apt|apt-get|yum|dnf|pacman)\s+(update|upgrade|dist-upgrade)", "Package system update"),
        (r"^(journalctl|dmesg)\s+.*-f", "Viewing system logs"),
        (r"^chroot\s+", "Changing root directory"),
        (r"^crontab\s+(-e|--edit)", "Cron job editing"),
        (r"^visudo\b", "Sudoers file editing"),
        (r"^nmcli\s+c(on)?(nection)?\s+(add|mod|delete)", "NetworkManager configuration"),
        (r"^usermod\s+", "User account modification"),
        (r"^git\s+(reset|rebase|push\s+.*--force)", "Git history modification"),
        (r"^ssh-keygen\b", "SSH key generation"),
        (r"^(dpkg-buildpackage|rpmbuild)\b", "Package building"),
        (r"^ldap(search|add|modify|delete)\b", "LDAP operations"),
        (r"^gem\s+(install|uninstall)", "Ruby gem management"),
        (r"^go\s+get\b", "Go package installation"),
        (r"^ifconfig\b", "Network interface configuration display/modification"),
    ] {
        rules.push(rule(pattern, RiskTier::Medium, reason));
    }

    // LOW — creation without overwrite, most informational tools.
    for (pattern, reason) in [
        (r"^mkdir\s+", "Creating directory"),
        (r"^touch\s+", "Creating/updating file timestamp"),
        (r"^git\s+(add|commit|fetch|pull|clone)", "Git repository operations"),
        (r"^(ps|top|htop|pstree)\b", "Process viewing"),
        (r"^(more|less|most)\b", "Text viewing with paging"),
        (r"^(ping|traceroute|mtr|dig|nslookup|host)\b", "Network diagnostics"),
        (r"^(cd|pushd|popd)\b", "Directory navigation"),
        (r"^(which|whereis|type)\b", "Command location"),
        (r"^(uname|hostname|uptime|free|df)\b", "System information"),
        (r"^(id|groups|whoami)\b", "User identification"),
        (r"^(screen|tmux|tput|reset|clear)\b", "Terminal utilities"),
        (r"^(date|cal|bc|expr)\b", "Basic utilities"),
        (r"^docker\s+(ps|images|inspect|logs)", "Docker inspection"),
        (r"^(apt|apt-get|yum|dnf|pacman)\s+(search|list|info|show)", "Package queries"),
        (r"^(zip|tar|gzip|bzip2|xz)\s+.*(-t|--list)", "Archive listing"),
        (r"^python[23]?\s+[\w./-]+", "Python script execution"),
        (r"^node\s+[\w./-]+", "Node.js script execution"),
        (r"^(basename|dirname|realpath|readlink)\b", "Path manipulation"),
        (r"^(fdisk|gdisk|parted)\s+.*-l", "Partition listing"),
        (r"^systemctl\s+(status|list-units|is-enabled|is-active)", "Systemd service queries"),
        (r"^(netstat|ss|lsof)\b", "Network connection status"),
        (r"^(docker|podman|lxc)\s+(ps|images|info|version)", "Container inspection"),
        (r"^(awk|sed|cut|tr|head|tail)\s+.*", "Text processing"),
    ] {
        rules.push(rule(pattern, RiskTier::Low, reason));
    }
    rules.push(rule_excluding(
        r"^cp\s+",
        RiskTier::Low,
        "Copying files (non-forced)",
        &["-f", "--force"],
    ));
    rules.push(rule_excluding(
        r"^(gzip|bzip2|xz|zip|tar)\s+",
        RiskTier::Low,
        "File compression",
        &["-d", "--decompress", "-x", "--extract"],
    ));
    rules.push(rule_excluding(r"^ssh\s+[\w.@:-]+", RiskTier::Low, "SSH connection", &["-R"]));

    // SAFE — read-only operations.
    for (pattern, reason) in [
        (r"^ls\s+", "Listing files"),
        (r"^dir\s+", "Listing files"),
        (r"^tree\s+", "Listing files in tree format"),
        (r"^ll\s+", "Listing files with details"),
        (r"^file\s+", "Determining file type"),
        (r"^stat\s+", "Displaying file status"),
        (r"^(cat|tac|rev|od|xxd|hexdump)\s+", "Reading file content"),
        (r"^(head|tail)\s+", "Reading file content"),
        (r"^(grep|egrep|fgrep|rg|ag)\s+", "Searching file content"),
        (r"^find\s+", "Finding files"),
        (r"^locate\s+", "Finding files using database"),
        (r"^du\s+", "Checking disk usage"),
        (r"^df\s+", "Checking filesystem space"),
        (r"^pwd\s*", "Printing working directory"),
        (r"^man\s+", "Displaying manual pages"),
        (r"^info\s+", "Displaying info documents"),
        (r"^help\s+", "Displaying help information"),
        (r"^whatis\s+", "Displaying command description"),
        (r"^apropos\s+", "Searching man pages"),
        (r"^(lscpu|lspci|lsusb|lsblk|lsmod|lshw|inxi)\b", "Listing hardware/modules"),
        (r"^(vmstat|iostat|mpstat|sar)\b", "Displaying system statistics"),
        (r"^(env|printenv|set)\b", "Displaying environment variables"),
        (r"^.*(-v|--version)\b", "Displaying version information"),
        (r"^version\b", "Displaying version information"),
        (r"^(date|cal|ncal)\b", "Displaying date or calendar"),
        (r"^ip\s+(addr|link|route)\s+(show|list|ls)\b", "Displaying network information"),
        (r"^(pgrep|pidof)\b", "Finding process IDs"),
        (r"^history\s*", "Displaying command history"),
        (r"^(echo|printf)\b", "Printing text"),
        (r"^(md5sum|sha1sum|sha256sum|sha512sum)\b", "Calculating file hash"),
        (r"^(wc|nl|expand|fold|fmt)\b", "Text viewing/formatting"),
        (r"^(dpkg|rpm)\s+(-l|--list|-q|--query)", "Listing installed packages"),
        (r"^systemctl\s+list", "Listing systemd units"),
        (r"^git\s+(status|log|diff|show|branch|tag)", "Git repository information"),
        (r"^ssh\s+-T", "Testing SSH connection"),
        (r"^docker\s+(info|version)", "Docker information"),
        (r"^openssl\s+x509\s+-text", "Displaying certificate information"),
        (r"^(ping|traceroute|tracepath|mtr)\s+(-c\s+\d+|--count=\d+)?", "Network connectivity testing"),
        (r"^(dig|host|nslookup)\b", "DNS querying"),
        (r"^(df|lsblk|blkid|findmnt)\b", "Filesystem information"),
        (r"^(alias|type|hash|true|false|test)\b", "Shell built-ins"),
        (r"^time\s+", "Timing command execution"),
        (r"^strace\s+-c", "Counting system calls"),
        (r"^(curl|wget)\s+(wttr\.in|v2\.wttr\.in)", "Weather information"),
    ] {
        rules.push(rule(pattern, RiskTier::Safe, reason));
    }

    rules
});

/// Override buckets, checked before `TIER_RULES` in the order
/// FORCE_CRITICAL, FORCE_HIGH, FORCE_MEDIUM, FORCE_SAFE.
pub static OVERRIDE_RULES: Lazy<Vec<ClassifierRule>> = Lazy::new(|| {
    let mut rules = Vec::new();

    for (pattern, reason) in [
        (r"[\s;|`]+rm\s+(-r|-f|--recursive|--force)\s+[~/]", "rm affecting home or root"),
        (r"[\s;|`]+rm\s+(-r|-f|--recursive|--force)\s+\.\.", "rm with parent directory reference"),
        (r"[\s;|`]+dd\s+(if=/dev/zero|of=/dev/sd|bs=[0-9]+[mM])", "dd writing to disks"),
        (r"[\s;|`]+shred\s+(/dev/sd|/dev/hd|/dev/nvme)", "shred on disk devices"),
        (r">\s*(/etc/passwd|/etc/shadow|/etc/sudoers|/etc/ssh/sshd_config)", "Writing to critical system files"),
        (r";\s*rm\s+(-r|-f|--recursive|--force)", "Hidden deletion command after separator"),
        (r"(curl|wget).*\|\s*(bash|sh|ksh|zsh|fish)", "Downloading and executing a script"),
        (r"(dd|fallocate)\s+.*if=/dev/zero.*of=[^/]", "Creating large files from /dev/zero"),
        (r"for\s+.*\s+in\s+.*;.*rm\s+", "Shell loop with file deletion"),
        (r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;:", "Fork bomb"),
        (r"(AWS_SECRET_ACCESS_KEY|DB_PASSWORD|MYSQL_ROOT_PASSWORD)=", "Exposing sensitive credentials"),
    ] {
        rules.push(rule(pattern, RiskTier::Critical, reason));
    }

    for (pattern, reason) in [
        (r"chmod\s+[0-7][0-7][0-7]\s+/etc/", "Changing permissions on system config"),
        (r"chown\s+\S+\s+/etc/", "Changing ownership on system config"),
        (r"(iptables|ufw)\s+.*--dport\s+(22|3389)", "Opening SSH/RDP ports"),
        (r"\|\s*sudo\s+", "Piping to sudo"),
        (r"&&\s*sudo\s+", "Command chaining with sudo"),
        (r">\s*/etc/", "Redirecting output to /etc/"),
    ] {
        rules.push(rule(pattern, RiskTier::High, reason));
    }

    for (pattern, reason) in [
        (r">\s*[^/]", "Simple output redirection"),
        (r">>\s*[^/]", "Append redirection"),
        (r"ssh\s+.*-L", "SSH port forwarding"),
        (r"curl\s+.*--output\s+\S+", "Curl downloading files"),
    ] {
        rules.push(rule(pattern, RiskTier::Medium, reason));
    }

    for (pattern, reason) in [
        (r"^grep\s+(-r|--recursive)?\s+[\w\s]+\s+[\w\s./-]+$", "Basic grep with fixed strings"),
        (r"^find\s+[\w\s./-]+\s+-name\s+[\w\s*./-]+$", "Basic find by name"),
        (r"^locate\s+[\w\s*./-]+$", "Basic locate"),
        (r"^ls\s+(-l|-a|--all|--long|--color|--human-readable|-h|-la|-lh|-lah)\s*[\w\s./-]*$", "Common ls variants"),
        (r"^cat\s+[\w\s./-]+$", "Basic cat"),
        (r"^less\s+[\w\s./-]+$", "Basic less"),
        (r"^head\s+(-n\s+\d+|--lines=\d+)?\s+[\w\s./-]+$", "Head with optional line count"),
        (r"^tail\s+(-n\s+\d+|--lines=\d+)?\s+[\w\s./-]+$", "Tail with optional line count"),
        (r"^(ps|pstree)\s+(-ef|-aux|-e|-a|--forest)$", "Common ps variants"),
        (r"^(top|htop|atop|btop)\s+(-d\s+\d+|--delay=\d+)?$", "Process viewers"),
        (r"^(ifconfig|ip\s+addr(\s+show)?|iwconfig|netstat|ss)$", "Network status commands"),
        (r"^ping\s+(-c\s+\d+)?\s+[\w.-]+$", "Basic ping"),
        (r"^df\s+(-h|--human-readable)?$", "Disk free space"),
        (r"^du\s+(-sh|--summary\s+--human-readable)?\s+[\w\s./-]*$", "Disk usage"),
        (r"^git\s+(status|log|branch|fetch|pull|diff|show)(\s+[\w.-]+)?$", "Common git commands"),
    ] {
        rules.push(rule(pattern, RiskTier::Safe, reason));
    }

    rules
});
